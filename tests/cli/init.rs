use anyhow::{Context, Result};
use serde_json::Value;

use crate::{CliTest, run};

#[test]
fn test_init_creates_config() -> Result<()> {
    let test = CliTest::new()?;

    let (code, stdout, _) = run({
        let mut cmd = test.command();
        cmd.arg("init");
        cmd
    })?;

    assert_eq!(code, 0);
    assert!(stdout.contains("Created .locsyncrc.json"), "{stdout}");
    assert!(test.root().join(".locsyncrc.json").exists());

    let content = test.read_file(".locsyncrc.json")?;
    let parsed: Value = serde_json::from_str(&content).context("Config should be valid JSON")?;
    assert_eq!(parsed["rebuildIntervalMs"], 500);
    assert_eq!(parsed["targets"][0]["l10nFuncNames"][0], "_");
    assert!(content.contains("  "), "Config should use 2-space indentation");

    Ok(())
}

#[test]
fn test_init_fails_if_exists() -> Result<()> {
    let test = CliTest::new()?;
    test.write_file(".locsyncrc.json", "{}")?;

    let (code, _, stderr) = run({
        let mut cmd = test.command();
        cmd.arg("init");
        cmd
    })?;

    assert_eq!(code, 1);
    assert!(stderr.contains(".locsyncrc.json already exists"), "{stderr}");
    assert_eq!(test.read_file(".locsyncrc.json")?, "{}");

    Ok(())
}
