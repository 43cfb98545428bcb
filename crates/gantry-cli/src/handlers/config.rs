//! Config command handler

use crate::config::CliConfig;
use crate::error::CliResult;
use gantry::PipelineConfig;

/// Execute the config command
pub fn execute_config(config: &CliConfig) -> CliResult<()> {
    let pipeline = config.load_pipeline()?;
    print!("{}", render_config(&pipeline)?);
    Ok(())
}

/// Effective configuration as YAML, prefixed with the resolved root
pub fn render_config(pipeline: &PipelineConfig) -> CliResult<String> {
    Ok(format!(
        "# root: {}\n{}",
        pipeline.root.display(),
        pipeline.to_yaml()?
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_defaults() {
        let rendered = render_config(&PipelineConfig::new("/proj")).unwrap();
        assert!(rendered.starts_with("# root: /proj\n"));
        assert!(rendered.contains("appDir: app"));
        assert!(rendered.contains("testDest: www/build/test"));
    }

    #[test]
    fn test_render_reflects_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("gantry.yaml"), "appDir: src\n").unwrap();

        let config = CliConfig::new().with_root(Some(temp.path().to_path_buf()));
        let pipeline = config.load_pipeline().unwrap();
        let rendered = render_config(&pipeline).unwrap();
        assert!(rendered.contains("appDir: src"));
    }
}
