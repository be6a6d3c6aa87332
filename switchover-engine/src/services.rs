//! Supervised service discovery and diffing.
//!
//! A service directory holds one subdirectory (usually a symlink to one) per
//! service, each with a `run` entry point. Two services are the same when
//! their entry points resolve to the same file.

use std::path::Path;

use switchover_core::{ReloadSignals, ServiceName, ServiceRecord, ServiceRecordSet};

use crate::SwitchError;

/// Entry point inside each service directory.
pub const RUN_ENTRY: &str = "run";

/// Read every service under `dir`.
///
/// Non-directory entries are skipped. An unreadable directory or an entry
/// point that does not resolve is a precondition failure.
pub fn read_services(dir: &Path) -> Result<ServiceRecordSet, SwitchError> {
    let dir_err = |source| SwitchError::ServiceDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut set = ServiceRecordSet::new();
    for entry in std::fs::read_dir(dir).map_err(dir_err)? {
        let entry = entry.map_err(dir_err)?;
        let path = entry.path();
        // Follows symlinks: live services are links into the store.
        if !path.is_dir() {
            continue;
        }

        // `sv` is driven by name; a lossy rendering would address another service.
        let name = match entry.file_name().into_string() {
            Ok(name) => ServiceName::from(name),
            Err(raw) => {
                tracing::warn!("skipping service with non-UTF-8 name {raw:?} in {}", dir.display());
                continue;
            }
        };
        let run = path.join(RUN_ENTRY);
        let target = std::fs::canonicalize(&run).map_err(|source| SwitchError::ServiceTarget {
            service: name.clone(),
            path: run.clone(),
            source,
        })?;

        tracing::debug!("service {name} -> {}", target.display());
        set.insert(name.clone(), ServiceRecord { name, target });
    }
    Ok(set)
}

/// What to do with each service when moving from one set to another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceDiff {
    /// Only in the new set.
    pub to_start: Vec<ServiceName>,
    /// Only in the old set.
    pub to_stop: Vec<ServiceName>,
    /// Changed, not in the reload table.
    pub to_restart: Vec<ServiceName>,
    /// Changed, in the reload table.
    pub to_reload: Vec<ServiceName>,
}

impl ServiceDiff {
    pub fn is_empty(&self) -> bool {
        self.to_start.is_empty()
            && self.to_stop.is_empty()
            && self.to_restart.is_empty()
            && self.to_reload.is_empty()
    }
}

/// Classify every service name of `old` and `new`.
///
/// Output lists are sorted by name.
pub fn diff_services(
    old: &ServiceRecordSet,
    new: &ServiceRecordSet,
    reload: &ReloadSignals,
) -> ServiceDiff {
    let mut diff = ServiceDiff::default();

    for (name, record) in new {
        match old.get(name) {
            None => diff.to_start.push(name.clone()),
            Some(previous) if previous == record => {}
            Some(_) if reload.contains(name) => diff.to_reload.push(name.clone()),
            Some(_) => diff.to_restart.push(name.clone()),
        }
    }

    diff.to_stop = old
        .keys()
        .filter(|name| !new.contains_key(*name))
        .cloned()
        .collect();

    diff
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs;
    use std::path::PathBuf;

    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    fn set(entries: &[(&str, &str)]) -> ServiceRecordSet {
        entries
            .iter()
            .map(|(name, target)| {
                let name = ServiceName::from(*name);
                let record = ServiceRecord {
                    name: name.clone(),
                    target: PathBuf::from(*target),
                };
                (name, record)
            })
            .collect()
    }

    fn names(list: &[ServiceName]) -> Vec<&str> {
        list.iter().map(|n| n.0.as_str()).collect()
    }

    #[test]
    fn added_and_removed_services() {
        let old = set(&[("web", "/store/a/run"), ("db", "/store/b/run")]);
        let new = set(&[("web", "/store/a/run"), ("cache", "/store/c/run")]);

        let diff = diff_services(&old, &new, &ReloadSignals::default());
        assert_eq!(names(&diff.to_start), ["cache"]);
        assert_eq!(names(&diff.to_stop), ["db"]);
        assert!(diff.to_restart.is_empty());
        assert!(diff.to_reload.is_empty());
    }

    #[rstest]
    #[case::generic("nginx", false)]
    #[case::allowlisted("lxcfs", true)]
    fn changed_target_restarts_or_reloads(#[case] service: &str, #[case] reloads: bool) {
        let old = set(&[(service, "/store/old/run")]);
        let new = set(&[(service, "/store/new/run")]);

        let diff = diff_services(&old, &new, &ReloadSignals::default());
        if reloads {
            assert_eq!(names(&diff.to_reload), [service]);
            assert!(diff.to_restart.is_empty());
        } else {
            assert_eq!(names(&diff.to_restart), [service]);
            assert!(diff.to_reload.is_empty());
        }
    }

    #[test]
    fn identical_sets_produce_empty_diff() {
        let both = set(&[("web", "/store/a/run"), ("lxcfs", "/store/l/run")]);
        let diff = diff_services(&both, &both.clone(), &ReloadSignals::default());
        assert!(diff.is_empty(), "got {diff:?}");
    }

    #[test]
    fn partition_is_disjoint_and_covers_changed_names() {
        let old = set(&[
            ("a", "/s/a1"),
            ("b", "/s/b1"),
            ("c", "/s/c1"),
            ("lxcfs", "/s/l1"),
            ("gone", "/s/g1"),
        ]);
        let new = set(&[
            ("a", "/s/a1"),
            ("b", "/s/b2"),
            ("c", "/s/c2"),
            ("lxcfs", "/s/l2"),
            ("fresh", "/s/f1"),
        ]);

        let diff = diff_services(&old, &new, &ReloadSignals::default());
        let lists = [
            &diff.to_start,
            &diff.to_stop,
            &diff.to_restart,
            &diff.to_reload,
        ];
        let mut seen = BTreeSet::new();
        for list in lists {
            for name in list {
                assert!(seen.insert(name.0.clone()), "{name} classified twice");
            }
        }

        let changed: BTreeSet<_> = diff
            .to_restart
            .iter()
            .chain(&diff.to_reload)
            .map(|n| n.0.as_str())
            .collect();
        assert_eq!(changed, BTreeSet::from(["b", "c", "lxcfs"]));
    }

    #[test]
    fn empty_reload_table_restarts_everything_changed() {
        let old = set(&[("lxcfs", "/s/l1")]);
        let new = set(&[("lxcfs", "/s/l2")]);
        let diff = diff_services(&old, &new, &ReloadSignals::empty());
        assert_eq!(names(&diff.to_restart), ["lxcfs"]);
    }

    #[cfg(unix)]
    #[test]
    fn read_services_resolves_run_symlinks_and_skips_files() {
        use std::os::unix::fs::symlink;

        let store = TempDir::new().expect("store");
        let service_dir = TempDir::new().expect("service dir");

        let realized = store.path().join("abc-sshd");
        fs::create_dir_all(&realized).expect("mkdir");
        fs::write(realized.join("run"), "#!/bin/sh\n").expect("write run");

        // Service directory is itself a link, and so is its entry point.
        let linked = store.path().join("sshd-svc");
        fs::create_dir_all(&linked).expect("mkdir");
        symlink(realized.join("run"), linked.join("run")).expect("link run");
        symlink(&linked, service_dir.path().join("sshd")).expect("link svc");

        fs::write(service_dir.path().join("README"), "not a service").expect("write");

        let services = read_services(service_dir.path()).expect("read");
        assert_eq!(services.len(), 1);
        let record = &services[&ServiceName::from("sshd")];
        assert_eq!(
            record.target,
            fs::canonicalize(realized.join("run")).expect("canonicalize")
        );
    }

    #[test]
    fn read_services_missing_dir_is_precondition_failure() {
        let root = TempDir::new().expect("root");
        let err = read_services(&root.path().join("absent")).unwrap_err();
        assert!(matches!(err, SwitchError::ServiceDir { .. }), "got: {err}");
    }

    #[test]
    fn read_services_dangling_entry_point_fails() {
        let root = TempDir::new().expect("root");
        fs::create_dir_all(root.path().join("broken")).expect("mkdir");

        let err = read_services(root.path()).unwrap_err();
        match err {
            SwitchError::ServiceTarget { service, .. } => assert_eq!(service.0, "broken"),
            other => panic!("expected ServiceTarget, got {other:?}"),
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_service_names_are_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let root = TempDir::new().expect("root");
        for name in [OsStr::new("sshd"), OsStr::from_bytes(b"bad\xffname")] {
            let service = root.path().join(name);
            fs::create_dir_all(&service).expect("mkdir");
            fs::write(service.join(RUN_ENTRY), "#!/bin/sh\n").expect("write run");
        }

        let services = read_services(root.path()).expect("read");
        let names: Vec<_> = services.keys().map(|n| n.0.as_str()).collect();
        assert_eq!(names, ["sshd"]);
    }
}
