use super::tables::{get_table, WAREHOUSE_TABLES};
use super::types::TableSchema;
use std::collections::{HashMap, HashSet, VecDeque};

/// Resolves dependencies between warehouse tables for export filtering
pub struct DependencyResolver {
    /// Map of table name -> tables it depends on
    deps: HashMap<&'static str, HashSet<&'static str>>,
    /// Map of table name -> tables that depend on it
    reverse_deps: HashMap<&'static str, HashSet<&'static str>>,
}

impl DependencyResolver {
    pub fn new() -> Self {
        let mut deps: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();
        let mut reverse_deps: HashMap<&'static str, HashSet<&'static str>> = HashMap::new();

        for table in WAREHOUSE_TABLES {
            let table_deps = table.dependencies();
            deps.insert(table.name, table_deps.clone());

            for dep in table_deps {
                reverse_deps.entry(dep).or_default().insert(table.name);
            }
        }

        Self { deps, reverse_deps }
    }

    /// Given a set of requested tables, resolve all required dependencies
    /// Returns tables in dependency order (dimensions before facts)
    pub fn resolve_includes(
        &self,
        requested: &[&str],
    ) -> Result<Vec<&'static TableSchema>, String> {
        let mut included: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = requested.iter().copied().collect();

        while let Some(table_name) = queue.pop_front() {
            if included.contains(table_name) {
                continue;
            }

            if get_table(table_name).is_none() {
                return Err(format!("Unknown table: {}", table_name));
            }

            included.insert(table_name);

            if let Some(table_deps) = self.deps.get(table_name) {
                for dep in table_deps {
                    if !included.contains(dep) {
                        queue.push_back(dep);
                    }
                }
            }
        }

        self.topological_sort(&included)
    }

    /// Given a set of tables to exclude, return remaining tables in order.
    /// Tables referencing an excluded table are dropped as well.
    pub fn resolve_excludes(&self, excluded: &[&str]) -> Result<Vec<&'static TableSchema>, String> {
        for name in excluded {
            if get_table(name).is_none() {
                return Err(format!("Unknown table: {}", name));
            }
        }

        let mut dropped: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = excluded.iter().copied().collect();

        while let Some(table_name) = queue.pop_front() {
            if !dropped.insert(table_name) {
                continue;
            }
            if let Some(dependents) = self.reverse_deps.get(table_name) {
                queue.extend(dependents.iter().copied());
            }
        }

        let included: HashSet<&str> = WAREHOUSE_TABLES
            .iter()
            .map(|t| t.name)
            .filter(|name| !dropped.contains(name))
            .collect();

        self.topological_sort(&included)
    }

    /// Return all tables in dependency order
    pub fn all_tables_ordered(&self) -> Vec<&'static TableSchema> {
        WAREHOUSE_TABLES.to_vec()
    }

    /// Topological sort of tables by dependencies.
    /// Roots are visited in declaration order so the result is stable.
    fn topological_sort(
        &self,
        included: &HashSet<&str>,
    ) -> Result<Vec<&'static TableSchema>, String> {
        let mut result = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut temp_visited: HashSet<&str> = HashSet::new();

        for table in WAREHOUSE_TABLES {
            if included.contains(table.name) && !visited.contains(table.name) {
                self.visit(
                    table.name,
                    included,
                    &mut visited,
                    &mut temp_visited,
                    &mut result,
                )?;
            }
        }

        Ok(result)
    }

    fn visit<'a>(
        &self,
        name: &'a str,
        included: &HashSet<&'a str>,
        visited: &mut HashSet<&'a str>,
        temp_visited: &mut HashSet<&'a str>,
        result: &mut Vec<&'static TableSchema>,
    ) -> Result<(), String> {
        if temp_visited.contains(name) {
            return Err(format!("Circular dependency detected at: {}", name));
        }
        if visited.contains(name) {
            return Ok(());
        }

        temp_visited.insert(name);

        if let Some(deps) = self.deps.get(name) {
            let mut deps: Vec<_> = deps.iter().copied().collect();
            deps.sort_unstable();
            for dep in deps {
                if dep != name && included.contains(dep) {
                    self.visit(dep, included, visited, temp_visited, result)?;
                }
            }
        }

        temp_visited.remove(name);
        visited.insert(name);

        if let Some(table) = get_table(name) {
            result.push(table);
        }

        Ok(())
    }
}

impl Default for DependencyResolver {
    fn default() -> Self {
        Self::new()
    }
}
