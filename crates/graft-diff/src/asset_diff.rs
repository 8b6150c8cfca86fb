//! Entry point tying the diff pipeline together.

use graft_types::{TypeDescriptors, Value};
use tracing::debug;

use crate::config::DiffConfig;
use crate::diff3::Diff3Tree;
use crate::error::DiffResult;
use crate::node::VisitTree;
use crate::two_way::DiffTree;

/// A three-way diff request over a base graph and two derived graphs.
///
/// Holds only borrowed inputs. Every [`compute`](Self::compute) call builds
/// fresh visit trees and returns a new [`Diff3Tree`]; nothing is cached, so
/// there is nothing to reset between calls. One instance may be shared
/// between threads.
#[derive(Clone)]
pub struct AssetDiff<'a> {
    descriptors: &'a dyn TypeDescriptors,
    base: &'a Value,
    asset1: &'a Value,
    asset2: &'a Value,
    config: DiffConfig,
}

impl<'a> AssetDiff<'a> {
    pub fn new(
        descriptors: &'a dyn TypeDescriptors,
        base: &'a Value,
        asset1: &'a Value,
        asset2: &'a Value,
    ) -> Self {
        Self {
            descriptors,
            base,
            asset1,
            asset2,
            config: DiffConfig::default(),
        }
    }

    /// Use `config` instead of the default configuration.
    pub fn with_config(mut self, config: DiffConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base(&self) -> &'a Value {
        self.base
    }

    pub fn asset1(&self) -> &'a Value {
        self.asset1
    }

    pub fn asset2(&self) -> &'a Value {
        self.asset2
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Build the three visit trees, diff both derived sides against base and
    /// combine the results.
    pub fn compute(&self) -> DiffResult<Diff3Tree<'a>> {
        let base = VisitTree::build(self.descriptors, self.base, &self.config)?;
        let asset1 = VisitTree::build(self.descriptors, self.asset1, &self.config)?;
        let asset2 = VisitTree::build(self.descriptors, self.asset2, &self.config)?;
        debug!(
            base = base.len(),
            asset1 = asset1.len(),
            asset2 = asset2.len(),
            "built visit trees"
        );

        let d1 = DiffTree::compute(&base, &asset1, &self.config)?;
        let d2 = DiffTree::compute(&base, &asset2, &self.config)?;
        Diff3Tree::combine(base, asset1, asset2, &d1, &d2, &self.config)
    }
}
