#![allow(missing_docs)]

use std::{net::SocketAddr, path::PathBuf};

use incoming::{
    config::{DEFAULT_DIR_NAME, DEFAULT_PORT},
    ConfigError, DiskStorage, FileNamePolicy, UploadConfig, UploadConfigBuilder, Uploader,
};

#[test]
fn default_config_listens_on_all_interfaces() {
    let config = UploadConfig::default();

    assert_eq!(config.addr.port(), DEFAULT_PORT);
    assert!(config.addr.ip().is_unspecified());
    assert!(config.dir.ends_with(DEFAULT_DIR_NAME));
    assert_eq!(config.file_names, FileNamePolicy::Verbatim);
    assert!(config.validate().is_ok());
}

#[test]
fn builder_applies_every_setting() {
    let addr: SocketAddr = "127.0.0.1:9000".parse().expect("addr");
    let config = UploadConfigBuilder::new()
        .dir("/tmp/uploads")
        .addr(addr)
        .file_names(FileNamePolicy::Sanitize)
        .build()
        .expect("config should build");

    assert_eq!(config.dir, PathBuf::from("/tmp/uploads"));
    assert_eq!(config.addr, addr);
    assert_eq!(config.file_names, FileNamePolicy::Sanitize);
}

#[test]
fn builder_exposes_snapshot_before_build() {
    let builder = Uploader::builder().dir("snap");
    assert_eq!(builder.config().dir, PathBuf::from("snap"));
}

#[test]
fn rejects_empty_directory() {
    let err = Uploader::builder().dir("").build().expect_err("must fail");
    assert_eq!(err, ConfigError::EmptyDirectory);

    let config = UploadConfig {
        dir: PathBuf::new(),
        ..UploadConfig::default()
    };
    assert!(matches!(
        Uploader::new(config),
        Err(ConfigError::EmptyDirectory)
    ));
}

#[test]
fn uploader_uses_configured_directory_and_policy() {
    let config = Uploader::builder()
        .dir("/srv/drop")
        .file_names(FileNamePolicy::BaseName)
        .build()
        .expect("config should build");
    let uploader = Uploader::new(config).expect("uploader should build");

    assert_eq!(uploader.storage().root(), std::path::Path::new("/srv/drop"));
    assert_eq!(uploader.storage().policy(), FileNamePolicy::BaseName);
    assert_eq!(uploader.config().dir, PathBuf::from("/srv/drop"));
}

#[test]
fn parses_file_name_policies() {
    assert_eq!("verbatim".parse::<FileNamePolicy>(), Ok(FileNamePolicy::Verbatim));
    assert_eq!("base-name".parse::<FileNamePolicy>(), Ok(FileNamePolicy::BaseName));
    assert_eq!("BaseName".parse::<FileNamePolicy>(), Ok(FileNamePolicy::BaseName));
    assert_eq!(" Sanitize ".parse::<FileNamePolicy>(), Ok(FileNamePolicy::Sanitize));
}

#[test]
fn rejects_unknown_file_name_policy() {
    let err = "strip".parse::<FileNamePolicy>().expect_err("must fail");
    assert_eq!(
        err,
        ConfigError::UnknownFileNamePolicy {
            value: "strip".to_owned()
        }
    );
    assert!(err.to_string().contains("expected verbatim"));
}

#[test]
fn file_name_policy_display_round_trips_through_from_str() {
    for policy in [
        FileNamePolicy::Verbatim,
        FileNamePolicy::BaseName,
        FileNamePolicy::Sanitize,
    ] {
        assert_eq!(policy.to_string().parse::<FileNamePolicy>(), Ok(policy));
    }
}

#[test]
fn disk_storage_builder_requires_destination() {
    let err = DiskStorage::builder()
        .file_names(FileNamePolicy::Sanitize)
        .build()
        .expect_err("must fail");
    assert_eq!(err, ConfigError::EmptyDirectory);
}
