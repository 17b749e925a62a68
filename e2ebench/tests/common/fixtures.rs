//! Test fixtures and data for harness tests

use std::path::{Path, PathBuf};

use e2ebench::BenchConfig;

pub struct TestFixtures;

impl TestFixtures {
    pub const ENV_NAME: &'static str = "demo";

    /// Blocks per generated fixture, mirroring a week of 2h-compacted data
    pub const PROM1_BLOCKS: usize = 9;

    /// Block directory names sort in creation order, like ULIDs do
    pub fn block_name(index: usize) -> String {
        format!("01FBLOCK{index:04}")
    }

    /// Create `count` block dirs with a meta file each under `dir`
    pub fn block_tree(dir: &Path, count: usize) {
        for index in 0..count {
            let block = dir.join(Self::block_name(index));
            std::fs::create_dir_all(block.join("chunks")).unwrap();
            std::fs::write(block.join("meta.json"), format!("{{\"block\":{index}}}")).unwrap();
            std::fs::write(block.join("chunks").join("000001"), b"chunk").unwrap();
        }
    }

    /// A populated fixture cache under `root`
    pub fn populated_cache(root: &Path) -> PathBuf {
        let data = root.join("data");
        Self::block_tree(&data.join("store1"), 2);
        Self::block_tree(&data.join("store2"), 2);
        Self::block_tree(&data.join("prom1"), Self::PROM1_BLOCKS);
        Self::block_tree(&data.join("prom2"), 3);
        data
    }

    /// Configuration rooted in a temp dir, never opening a browser
    pub fn config(root: &Path) -> BenchConfig {
        BenchConfig::builder()
            .data_dir(root.join("data"))
            .work_dir(root.join("work"))
            .env_name(Self::ENV_NAME)
            .open_browser(false)
            .build()
    }

    /// Querier metrics with `connections` established store connections
    pub fn querier_exposition(connections: u32) -> String {
        format!(
            "# HELP thanos_store_nodes_grpc_connections Number of gRPC connection to Store APIs.\n\
             # TYPE thanos_store_nodes_grpc_connections gauge\n\
             thanos_store_nodes_grpc_connections{{external_labels=\"{{cluster=\\\"eu-1\\\"}}\",store_type=\"sidecar\"}} {connections}\n"
        )
    }

    /// Sorted names of the immediate subdirectories of `dir`
    pub fn subdir_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap())
            .filter(|entry| entry.file_type().unwrap().is_dir())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}
