use anyhow::Result;

use crate::{CliTest, run};

const APP_PY: &str = "print(_(\"hello\"))\nprint(_('bye'))\n";
const EN_PO: &str = "msgid \"hello\"\nmsgstr \"Hello\"\n\nmsgid \"bye\"\nmsgstr \"Bye\"\n";

fn project() -> Result<CliTest> {
    CliTest::with_files(&[("src/app.py", APP_PY), ("locales/en.po", EN_PO)])
}

#[test]
fn test_rename_dry_run_leaves_files() -> Result<()> {
    let test = project()?;

    let (code, stdout, _) = run(test.rename_command("hello", "greeting"))?;

    assert_eq!(code, 0);
    assert!(stdout.contains("  --> ./src/app.py:1:10"), "{stdout}");
    assert!(stdout.contains("      + greeting"), "{stdout}");
    assert!(
        stdout.contains("Would rename 'hello' to 'greeting': 2 location(s) in 2 file(s)."),
        "{stdout}"
    );
    assert_eq!(test.read_file("src/app.py")?, APP_PY);
    assert_eq!(test.read_file("locales/en.po")?, EN_PO);
    Ok(())
}

#[test]
fn test_rename_apply_rewrites_code_and_catalog() -> Result<()> {
    let test = project()?;

    let mut cmd = test.rename_command("bye", "farewell");
    cmd.arg("--apply");
    let (code, stdout, _) = run(cmd)?;

    assert_eq!(code, 0);
    assert!(stdout.contains("Renamed 'bye' to 'farewell'"), "{stdout}");
    assert_eq!(
        test.read_file("src/app.py")?,
        "print(_(\"hello\"))\nprint(_('farewell'))\n"
    );
    assert_eq!(
        test.read_file("locales/en.po")?,
        "msgid \"hello\"\nmsgstr \"Hello\"\n\nmsgid \"farewell\"\nmsgstr \"Bye\"\n"
    );

    let (code, stdout, _) = run(test.check_command())?;
    assert_eq!(code, 0, "{stdout}");
    Ok(())
}

#[test]
fn test_rename_conflict_fails_without_edits() -> Result<()> {
    let test = project()?;

    let mut cmd = test.rename_command("hello", "bye");
    cmd.arg("--apply");
    let (code, _, stderr) = run(cmd)?;

    assert_eq!(code, 2);
    assert!(
        stderr.contains("cannot rename 'hello' to 'bye': key 'bye' already exists"),
        "{stderr}"
    );
    assert_eq!(test.read_file("src/app.py")?, APP_PY);
    assert_eq!(test.read_file("locales/en.po")?, EN_PO);
    Ok(())
}

#[test]
fn test_rename_unknown_key() -> Result<()> {
    let test = project()?;

    let (code, stdout, _) = run(test.rename_command("nothing", "something"))?;

    assert_eq!(code, 0);
    assert!(stdout.contains("No locations of 'nothing' found."), "{stdout}");
    Ok(())
}
