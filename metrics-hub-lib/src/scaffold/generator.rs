use super::{MetricBlueprint, templates, user_code};
use crate::Result;
use camino::{Utf8Path, Utf8PathBuf};
use ohno::{IntoAppError, bail};
use std::fs;
use std::io;
use strum::Display;

const LOG_TARGET: &str = "  scaffold";

/// Directories generated files are written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub metrics_dir: Utf8PathBuf,
    pub implementations_dir: Utf8PathBuf,
    pub tests_dir: Utf8PathBuf,
    pub deploy_dir: Utf8PathBuf,
}

impl Layout {
    #[must_use]
    pub fn config_path(&self, id: &str) -> Utf8PathBuf {
        self.metrics_dir.join(format!("{id}.yaml"))
    }

    #[must_use]
    pub fn implementation_path(&self, id: &str) -> Utf8PathBuf {
        self.implementations_dir.join(format!("{id}.rs"))
    }

    #[must_use]
    pub fn test_path(&self, id: &str) -> Utf8PathBuf {
        self.tests_dir.join(format!("{id}_test.rs"))
    }

    #[must_use]
    pub fn deploy_path(&self, id: &str) -> Utf8PathBuf {
        self.deploy_dir.join(format!("{id}.sh"))
    }

    /// Every file the generator may produce for a metric.
    #[must_use]
    pub fn artifacts(&self, id: &str) -> [Utf8PathBuf; 4] {
        [self.config_path(id), self.implementation_path(id), self.test_path(id), self.deploy_path(id)]
    }
}

/// How regeneration treats files that already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerateOptions {
    pub preserve_user_code: bool,
    pub overwrite_tests: bool,
    pub overwrite_deploy: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            preserve_user_code: true,
            overwrite_tests: false,
            overwrite_deploy: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum MaterializeStatus {
    Created,
    Updated,
    Skipped,
}

/// Writes a blueprint's configuration document.
///
/// # Errors
///
/// Fails when the document exists and `overwrite` is false, or on I/O errors.
pub fn write_config(layout: &Layout, blueprint: &MetricBlueprint, overwrite: bool) -> Result<Utf8PathBuf> {
    let path = layout.config_path(&blueprint.id);
    if path.exists() && !overwrite {
        bail!("configuration already exists at '{path}'; use --overwrite to replace it");
    }

    fs::create_dir_all(&layout.metrics_dir).into_app_err_with(|| format!("creating directory '{}'", layout.metrics_dir))?;
    let yaml = blueprint.to_config().to_yaml()?;
    fs::write(&path, yaml).into_app_err_with(|| format!("writing configuration '{path}'"))?;

    log::info!(target: LOG_TARGET, "Wrote configuration '{path}'");
    Ok(path)
}

/// Generates or refreshes the implementation, test, and deployment files.
///
/// The implementation is always rewritten; its user region is carried over from the
/// existing file when `preserve_user_code` is set. Test and deployment files are
/// left alone when they exist unless the matching overwrite option is set.
///
/// # Errors
///
/// Fails on I/O errors or when a template cannot be rendered.
pub fn materialize(layout: &Layout, blueprint: &MetricBlueprint, options: GenerateOptions) -> Result<Vec<(Utf8PathBuf, MaterializeStatus)>> {
    let id = &blueprint.id;
    let mut statuses = Vec::with_capacity(3);

    let impl_path = layout.implementation_path(id);
    let (template, fallback) = templates::implementation(blueprint)?;
    let existing = if options.preserve_user_code { read_existing(&impl_path)? } else { None };
    let preserved = existing.as_deref().and_then(user_code::extract);
    if existing.is_some() && preserved.is_none() {
        log::warn!(target: LOG_TARGET, "No user code region found in '{impl_path}', using the default region");
    }

    let code = user_code::inject(&template, preserved, &fallback);
    statuses.push((impl_path.clone(), write_file(&impl_path, &code)?));

    let test_path = layout.test_path(id);
    if test_path.exists() && !options.overwrite_tests {
        statuses.push((test_path, MaterializeStatus::Skipped));
    } else {
        let from_tests = templates::relative_path(&layout.tests_dir, &impl_path);
        let code = templates::tests(blueprint, &from_tests)?;
        let status = write_file(&test_path, &code)?;
        statuses.push((test_path, status));
    }

    let deploy_path = layout.deploy_path(id);
    if deploy_path.exists() && !options.overwrite_deploy {
        statuses.push((deploy_path, MaterializeStatus::Skipped));
    } else {
        let code = templates::deploy(blueprint, &layout.metrics_dir)?;
        let status = write_file(&deploy_path, &code)?;
        statuses.push((deploy_path, status));
    }

    for (path, status) in &statuses {
        log::debug!(target: LOG_TARGET, "{status} '{path}'");
    }

    Ok(statuses)
}

/// Deletes every generated file of a metric and returns the ones that existed.
///
/// # Errors
///
/// Fails when an existing file cannot be removed.
pub fn remove(layout: &Layout, id: &str) -> Result<Vec<Utf8PathBuf>> {
    let mut removed = Vec::new();

    for path in layout.artifacts(id) {
        match fs::remove_file(&path) {
            Ok(()) => {
                log::info!(target: LOG_TARGET, "Removed '{path}'");
                removed.push(path);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e).into_app_err_with(|| format!("removing '{path}'")),
        }
    }

    Ok(removed)
}

fn read_existing(path: &Utf8Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).into_app_err_with(|| format!("reading '{path}'")),
    }
}

fn write_file(path: &Utf8Path, contents: &str) -> Result<MaterializeStatus> {
    let status = if path.exists() { MaterializeStatus::Updated } else { MaterializeStatus::Created };

    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        fs::create_dir_all(parent).into_app_err_with(|| format!("creating directory '{parent}'"))?;
    }

    fs::write(path, contents).into_app_err_with(|| format!("writing '{path}'"))?;
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricConfig, TemplateKind};

    fn layout(root: &Utf8Path) -> Layout {
        Layout {
            metrics_dir: root.join("metrics"),
            implementations_dir: root.join("src/metrics"),
            tests_dir: root.join("tests"),
            deploy_dir: root.join("deploy"),
        }
    }

    fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        (dir, root)
    }

    fn blueprint() -> MetricBlueprint {
        MetricBlueprint::create("calc", "demo", "Demo calculator", TemplateKind::Simple, false)
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_create_writes_all_artifacts() {
        let (_dir, root) = temp_root();
        let layout = layout(&root);
        let blueprint = blueprint();

        let config_path = write_config(&layout, &blueprint, false).unwrap();
        let statuses = materialize(&layout, &blueprint, GenerateOptions::default()).unwrap();

        assert!(statuses.iter().all(|(_, s)| *s == MaterializeStatus::Created));
        for path in layout.artifacts("demo_calc") {
            assert!(path.exists(), "{path}");
        }

        let config = MetricConfig::load(&config_path).unwrap();
        assert_eq!(config.id, "demo_calc");
        assert_eq!(config.template, Some(TemplateKind::Simple));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_config_is_not_overwritten_by_default() {
        let (_dir, root) = temp_root();
        let layout = layout(&root);

        let _ = write_config(&layout, &blueprint(), false).unwrap();
        let err = write_config(&layout, &blueprint(), false).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        let _ = write_config(&layout, &blueprint(), true).unwrap();
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_regeneration_preserves_user_code() {
        let (_dir, root) = temp_root();
        let layout = layout(&root);
        let blueprint = blueprint();
        let _ = materialize(&layout, &blueprint, GenerateOptions::default()).unwrap();

        let impl_path = layout.implementation_path("demo_calc");
        let original = fs::read_to_string(&impl_path).unwrap();
        let edited = original.replace("MetricValue::Float(base * 2.0)", "MetricValue::Float(base * 3.0 + 1.0)");
        fs::write(&impl_path, &edited).unwrap();

        let mut renamed = blueprint.clone();
        renamed.description = "Renamed calculator".to_string();
        let statuses = materialize(&layout, &renamed, GenerateOptions::default()).unwrap();
        assert_eq!(statuses[0].1, MaterializeStatus::Updated);
        assert_eq!(statuses[1].1, MaterializeStatus::Skipped);
        assert_eq!(statuses[2].1, MaterializeStatus::Skipped);

        let regenerated = fs::read_to_string(&impl_path).unwrap();
        assert!(regenerated.starts_with("//! Renamed calculator"));
        assert_eq!(user_code::extract(&regenerated), user_code::extract(&edited));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_regeneration_is_idempotent() {
        let (_dir, root) = temp_root();
        let layout = layout(&root);
        let _ = materialize(&layout, &blueprint(), GenerateOptions::default()).unwrap();
        let first = fs::read_to_string(layout.implementation_path("demo_calc")).unwrap();

        let _ = materialize(&layout, &blueprint(), GenerateOptions::default()).unwrap();
        let second = fs::read_to_string(layout.implementation_path("demo_calc")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_without_preservation_region_is_reset() {
        let (_dir, root) = temp_root();
        let layout = layout(&root);
        let _ = materialize(&layout, &blueprint(), GenerateOptions::default()).unwrap();

        let impl_path = layout.implementation_path("demo_calc");
        let pristine = fs::read_to_string(&impl_path).unwrap();
        fs::write(&impl_path, pristine.replace("* 2.0", "* 5.0")).unwrap();

        let options = GenerateOptions {
            preserve_user_code: false,
            overwrite_tests: true,
            overwrite_deploy: true,
        };
        let statuses = materialize(&layout, &blueprint(), options).unwrap();
        assert!(statuses.iter().all(|(_, s)| *s == MaterializeStatus::Updated));
        assert_eq!(fs::read_to_string(&impl_path).unwrap(), pristine);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_remove_deletes_existing_artifacts() {
        let (_dir, root) = temp_root();
        let layout = layout(&root);
        let _ = write_config(&layout, &blueprint(), false).unwrap();
        let _ = materialize(&layout, &blueprint(), GenerateOptions::default()).unwrap();
        fs::remove_file(layout.deploy_path("demo_calc")).unwrap();

        let removed = remove(&layout, "demo_calc").unwrap();
        assert_eq!(removed.len(), 3);
        assert!(layout.artifacts("demo_calc").iter().all(|p| !p.exists()));
        assert!(remove(&layout, "demo_calc").unwrap().is_empty());
    }
}
