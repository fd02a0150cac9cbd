use std::path::{Path, PathBuf};
use std::sync::Arc;

use boundary_importer_pipeline::orchestrator::{ImportPlan, ParentLinkMode};
use boundary_importer_repository::{BoundaryStore, RestBoundaryStore};

/// `Dependencies` struct holds the necessary components for the importer.
///
/// It includes the boundary store client, the three-layer import plan, and
/// the optional coordinate export target.
pub struct Dependencies {
    pub store: Arc<dyn BoundaryStore>,
    pub plan: ImportPlan,
    pub coordinates_out: Option<PathBuf>,
}

impl Dependencies {
    /// Creates a new `Dependencies` instance.
    ///
    /// This function is responsible for reading the environment and wiring
    /// up the store client and layer plans the importer requires:
    ///
    /// * `SUPABASE_URL` / `SUPABASE_SERVICE_KEY` - remote store location
    ///   and credential (required).
    /// * `SHAPEFILE_DIR` - directory holding `Division.shp`, `Range.shp`
    ///   and `Beat.shp` (required).
    /// * `PARENT_LINK` - `key` (default) or `spatial` parent linkage.
    /// * `COORDINATES_OUT` - optional path for the coordinate export.
    pub fn new() -> Self {
        let store_url = std::env::var("SUPABASE_URL").expect("SUPABASE_URL must be set");
        let service_key =
            std::env::var("SUPABASE_SERVICE_KEY").expect("SUPABASE_SERVICE_KEY must be set");
        let shapefile_dir = std::env::var("SHAPEFILE_DIR").expect("SHAPEFILE_DIR must be set");

        let mode = match std::env::var("PARENT_LINK").as_deref() {
            Ok("spatial") => ParentLinkMode::Containment,
            Ok("key") | Err(_) => ParentLinkMode::BusinessKey,
            Ok(other) => panic!("PARENT_LINK must be \"key\" or \"spatial\", got {other:?}"),
        };
        let coordinates_out = std::env::var("COORDINATES_OUT").ok().map(PathBuf::from);

        Dependencies {
            store: Arc::new(RestBoundaryStore::new(store_url, service_key)),
            plan: ImportPlan::standard(Path::new(&shapefile_dir), mode),
            coordinates_out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boundary_importer_pipeline::orchestrator::LinkStrategy;
    use serial_test::serial;
    use std::env;

    // Helper function to set test environment variables
    fn set_test_env_vars() {
        unsafe {
            env::set_var("SUPABASE_URL", "https://test-project.supabase.co");
            env::set_var("SUPABASE_SERVICE_KEY", "test-service-key");
            env::set_var("SHAPEFILE_DIR", "/data/layers");
        }
    }

    // Helper function to clear environment variables
    fn clear_env_vars() {
        unsafe {
            env::remove_var("SUPABASE_URL");
            env::remove_var("SUPABASE_SERVICE_KEY");
            env::remove_var("SHAPEFILE_DIR");
            env::remove_var("PARENT_LINK");
            env::remove_var("COORDINATES_OUT");
        }
    }

    #[test]
    #[serial]
    #[should_panic(expected = "SUPABASE_URL must be set")]
    fn test_dependencies_new_missing_store_url() {
        clear_env_vars();
        unsafe {
            env::set_var("SUPABASE_SERVICE_KEY", "test-service-key");
            env::set_var("SHAPEFILE_DIR", "/data/layers");
        }

        let _ = Dependencies::new();
    }

    #[test]
    #[serial]
    #[should_panic(expected = "SHAPEFILE_DIR must be set")]
    fn test_dependencies_new_missing_shapefile_dir() {
        clear_env_vars();
        unsafe {
            env::set_var("SUPABASE_URL", "https://test-project.supabase.co");
            env::set_var("SUPABASE_SERVICE_KEY", "test-service-key");
        }

        let _ = Dependencies::new();
    }

    #[test]
    #[serial]
    fn test_dependencies_new_defaults_to_key_linkage() {
        clear_env_vars();
        set_test_env_vars();

        let dependencies = Dependencies::new();
        assert_eq!(dependencies.plan.range.link, LinkStrategy::BusinessKey);
        assert_eq!(dependencies.plan.beat.link, LinkStrategy::BusinessKey);
        assert!(dependencies.coordinates_out.is_none());
    }

    #[test]
    #[serial]
    fn test_dependencies_new_spatial_linkage() {
        clear_env_vars();
        set_test_env_vars();
        unsafe {
            env::set_var("PARENT_LINK", "spatial");
            env::set_var("COORDINATES_OUT", "/tmp/coordinates.json");
        }

        let dependencies = Dependencies::new();
        assert_eq!(dependencies.plan.range.link, LinkStrategy::Containment);
        assert_eq!(dependencies.plan.beat.link, LinkStrategy::Containment);
        assert_eq!(
            dependencies.coordinates_out,
            Some(PathBuf::from("/tmp/coordinates.json"))
        );
    }

    #[test]
    #[serial]
    #[should_panic(expected = "PARENT_LINK must be")]
    fn test_dependencies_new_rejects_unknown_linkage() {
        clear_env_vars();
        set_test_env_vars();
        unsafe {
            env::set_var("PARENT_LINK", "both");
        }

        let _ = Dependencies::new();
    }
}
