use crate::schema::{DependencyResolver, TableSchema};
use anyhow::{anyhow, bail, Result};
use tracing::{debug, info};

/// Resolves which warehouse tables to export based on include/exclude filters
pub fn resolve_tables(
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
) -> Result<Vec<&'static TableSchema>> {
    let resolver = DependencyResolver::new();

    match (include, exclude) {
        (Some(_), Some(_)) => {
            bail!("Cannot use both --include and --exclude at the same time");
        }
        (Some(include_list), None) => {
            let refs: Vec<&str> = include_list.iter().map(|s| s.as_str()).collect();
            debug!(tables = ?refs, "Resolving dependencies");
            let tables = resolver.resolve_includes(&refs).map_err(|e| anyhow!(e))?;

            info!("Exporting {} tables", tables.len());
            for t in &tables {
                debug!("  - {}", t.name);
            }

            Ok(tables)
        }
        (None, Some(exclude_list)) => {
            let refs: Vec<&str> = exclude_list.iter().map(|s| s.as_str()).collect();
            debug!(tables = ?refs, "Excluding tables");
            let tables = resolver.resolve_excludes(&refs).map_err(|e| anyhow!(e))?;

            info!("Exporting {} tables (after exclusions)", tables.len());

            Ok(tables)
        }
        (None, None) => Ok(resolver.all_tables_ordered()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(tables: &[&TableSchema]) -> Vec<&'static str> {
        tables.iter().map(|t| t.name).collect()
    }

    #[test]
    fn test_include_and_exclude_conflict() {
        let result = resolve_tables(Some(vec!["user_dimension".into()]), Some(vec!["plan_dimension".into()]));
        assert!(result.is_err());
    }

    #[test]
    fn test_include_pulls_in_dimensions() {
        let tables = resolve_tables(Some(vec!["payment_fact".into()]), None).unwrap();
        let names = names(&tables);
        assert!(names.contains(&"plan_dimension"));
        assert!(names.contains(&"time_dimension"));
        assert_eq!(names.last(), Some(&"payment_fact"));
        assert!(!names.contains(&"channel_dimension"));
    }

    #[test]
    fn test_unknown_table_is_an_error() {
        assert!(resolve_tables(Some(vec!["nope".into()]), None).is_err());
    }

    #[test]
    fn test_no_filter_returns_everything() {
        assert_eq!(resolve_tables(None, None).unwrap().len(), 9);
    }
}
