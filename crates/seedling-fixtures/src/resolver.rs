//! Dependency ordering of fixtures.
//!
//! [`DependencyResolver`] orders fixture names so that every model comes
//! after all of its transitive dependencies. It works in two phases:
//!
//! 1. **Expansion**: every name reachable from the requested names through
//!    `dependencies` is collected once. Unknown names fail with
//!    [`FixtureError::ModelNotFound`].
//! 2. **Ordering**: a depth-first post-order walk over the expanded names.
//!    Each walk carries its own copy of the ancestor path; meeting a name
//!    already on that path fails with [`FixtureError::DependencyLoop`].
//!
//! Shared dependencies (diamonds) appear exactly once, and ties are broken
//! by input order.
//!
//! # Example
//!
//! ```
//! use indexmap::IndexMap;
//! use seedling_fixtures::definition::{FixtureDefinition, RecordMap};
//! use seedling_fixtures::resolver::DependencyResolver;
//!
//! let mut fixtures = IndexMap::new();
//! for (name, deps) in [("a", vec![]), ("b", vec!["a"]), ("c", vec!["a"]), ("d", vec!["b", "c"])] {
//! 	let fixture = FixtureDefinition::records(name, RecordMap::new()).with_dependencies(deps);
//! 	fixtures.insert(name.to_string(), fixture);
//! }
//!
//! let order = DependencyResolver::new(&fixtures).resolve_order(["d", "c", "b", "a"]).unwrap();
//! assert_eq!(order, vec!["a", "b", "c", "d"]);
//! ```

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};

use crate::definition::FixtureDefinition;
use crate::error::{FixtureError, FixtureResult};

/// Orders fixtures by their dependencies.
#[derive(Debug, Clone, Copy)]
pub struct DependencyResolver<'a> {
	fixtures: &'a IndexMap<String, FixtureDefinition>,
}

impl<'a> DependencyResolver<'a> {
	/// Creates a resolver over the known fixtures.
	pub fn new(fixtures: &'a IndexMap<String, FixtureDefinition>) -> Self {
		Self { fixtures }
	}

	/// Returns `names` and all of their transitive dependencies in
	/// dependency order.
	///
	/// # Errors
	///
	/// Returns [`FixtureError::ModelNotFound`] if a name, requested or
	/// depended upon, has no fixture, and [`FixtureError::DependencyLoop`] if
	/// the dependencies form a cycle.
	pub fn resolve_order<I, S>(&self, names: I) -> FixtureResult<Vec<String>>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut expanded = IndexSet::new();
		for name in names {
			self.expand(name.as_ref(), &mut expanded)?;
		}

		let mut visited = HashSet::new();
		let mut sorted = Vec::with_capacity(expanded.len());
		for name in &expanded {
			self.visit(name, Vec::new(), &mut visited, &mut sorted)?;
		}
		tracing::trace!(order = ?sorted, "resolved fixture order");
		Ok(sorted)
	}

	fn expand(&self, name: &str, expanded: &mut IndexSet<String>) -> FixtureResult<()> {
		if expanded.contains(name) {
			return Ok(());
		}
		expanded.insert(name.to_string());
		for dependency in self.definition(name)?.dependencies() {
			self.expand(dependency, expanded)?;
		}
		Ok(())
	}

	fn visit(
		&self,
		name: &str,
		mut ancestors: Vec<String>,
		visited: &mut HashSet<String>,
		sorted: &mut Vec<String>,
	) -> FixtureResult<()> {
		if visited.contains(name) {
			return Ok(());
		}
		ancestors.push(name.to_string());
		visited.insert(name.to_string());

		for dependency in self.definition(name)?.dependencies() {
			if let Some(start) = ancestors.iter().position(|a| a == dependency) {
				let mut path = ancestors[start..].to_vec();
				path.push(dependency.clone());
				return Err(FixtureError::DependencyLoop { path });
			}
			self.visit(dependency, ancestors.clone(), visited, sorted)?;
		}
		sorted.push(name.to_string());
		Ok(())
	}

	fn definition(&self, name: &str) -> FixtureResult<&'a FixtureDefinition> {
		self.fixtures
			.get(name)
			.ok_or_else(|| FixtureError::ModelNotFound(name.to_string()))
	}
}
