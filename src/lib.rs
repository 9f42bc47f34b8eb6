/*!
# Overview
s3tree-rs presents the flat key namespace of an Amazon S3 bucket as folders
and files, and deletes folders and buckets only when they are empty.

## Features
- **One-level listings**: folders (common prefixes) and files directly under a prefix
- **Accurate folder totals**: recursive item count and byte size, walking every page
- **Non-empty protection**: folder and bucket deletes are refused unless empty
  (a folder holding only its zero-byte marker counts as empty)
- **Partial failure as data**: a folder that cannot be read reports `N/A`
  instead of failing the whole listing
- **Library-First**: the s3tree CLI is a thin wrapper over this library

## As a Library

```toml
[dependencies]
s3tree-rs = "0.1"
tokio = { version = "1", features = ["full"] }
```

```no_run
use s3tree_rs::config::args::build_config_from_args;
use s3tree_rs::ObjectBrowser;

#[tokio::main]
async fn main() {
    let config = build_config_from_args(vec!["s3tree", "ls", "s3://my-bucket/docs/"]).unwrap();
    let browser = ObjectBrowser::create(&config).await;

    match browser.execute(&config.command).await {
        Ok(response) => println!("{}", response.to_json(true).unwrap()),
        Err(e) => eprintln!("{e:#}"),
    }
}
```
*/

pub mod aggregate;
pub mod browser;
pub mod catalog;
pub mod config;
pub mod enumerator;
pub mod hierarchy;
pub mod region;
pub mod response;
pub mod safety;
pub mod size_format;
pub mod storage;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use browser::ObjectBrowser;
pub use config::Config;
pub use types::error::S3treeError;
pub use types::{AggregateStats, DeleteOutcome, ItemCount};
