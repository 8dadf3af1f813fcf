use anyhow::Result;

use crate::{CliTest, run};

const EN_PO: &str = r#"msgid "hello"
msgstr "Hello"
"#;

#[test]
fn test_check_clean_project() -> Result<()> {
    let test = CliTest::with_files(&[
        ("src/app.py", "print(_(\"hello\"))\n"),
        ("locales/en.po", EN_PO),
    ])?;

    let (code, stdout, _) = run(test.check_command())?;

    assert_eq!(code, 0);
    assert!(
        stdout.contains("Checked 1 code file, 1 catalog file - no problems found"),
        "{stdout}"
    );
    Ok(())
}

#[test]
fn test_check_undefined_key() -> Result<()> {
    let test = CliTest::with_files(&[
        ("src/app.py", "_(\"hello\")\n_(\"bye\")\n"),
        ("locales/en.po", EN_PO),
    ])?;

    let (code, stdout, _) = run(test.check_command())?;

    assert_eq!(code, 1);
    assert!(
        stdout.contains("warning: \"undefined localization key 'bye' used in code\"  undefined-key"),
        "{stdout}"
    );
    assert!(stdout.contains("  --> ./src/app.py:2:4"), "{stdout}");
    assert!(stdout.contains("2 | _(\"bye\")"), "{stdout}");
    assert!(stdout.contains("1 problems (0 errors, 1 warning)"), "{stdout}");
    Ok(())
}

#[test]
fn test_check_unused_key_is_a_note() -> Result<()> {
    let test = CliTest::with_files(&[
        ("src/app.py", "_(\"hello\")\n"),
        ("locales/en.po", "msgid \"hello\"\nmsgstr \"Hello\"\n\nmsgid \"old\"\nmsgstr \"Old\"\n"),
    ])?;

    let (code, stdout, _) = run(test.check_command())?;

    assert_eq!(code, 0);
    assert!(
        stdout.contains("info: \"localization key 'old' is not used in code\"  unused-key"),
        "{stdout}"
    );
    assert!(stdout.contains("1 note"), "{stdout}");
    Ok(())
}

#[test]
fn test_check_missing_translation() -> Result<()> {
    let test = CliTest::with_files(&[
        ("src/app.py", "_(\"hello\")\n_(\"bye\")\n"),
        ("locales/en.po", "msgid \"hello\"\nmsgstr \"Hello\"\n\nmsgid \"bye\"\nmsgstr \"Bye\"\n"),
        ("locales/ja.po", "msgid \"hello\"\nmsgstr \"こんにちは\"\n"),
    ])?;

    let (code, stdout, _) = run(test.check_command())?;

    assert_eq!(code, 1);
    assert!(
        stdout.contains("missing translation for key 'bye' in language 'ja'"),
        "{stdout}"
    );
    assert!(stdout.contains("  --> ./locales/ja.po:1:1"), "{stdout}");
    Ok(())
}

#[test]
fn test_check_catalog_errors() -> Result<()> {
    let test = CliTest::with_files(&[
        ("src/app.py", "_(\"hello\")\n"),
        ("locales/en.po", "msgid \"hello\"\nmsgstr \"Hello\"\n\nmsgid \"broken\"\n"),
    ])?;

    let (code, stdout, _) = run(test.check_command())?;

    assert_eq!(code, 1);
    assert!(stdout.contains("error: "), "{stdout}");
    assert!(stdout.contains("missing-value"), "{stdout}");
    Ok(())
}

#[test]
fn test_check_reports_settings_problems() -> Result<()> {
    let test = CliTest::with_files(&[
        (
            ".locsyncrc.json",
            r#"{
  "targets": [
    {
      "codeLanguages": ["python"],
      "codeDirs": ["src", "missing"],
      "l10nFormat": "po",
      "l10nDirs": ["locales"],
      "l10nExtension": ".po",
      "l10nFuncNames": ["_"]
    },
    { "codeLanguages": ["python"] }
  ]
}"#,
        ),
        ("src/app.py", "_(\"hello\")\n"),
        ("locales/en.po", EN_PO),
    ])?;

    let (code, stdout, _) = run(test.check_command())?;

    assert_eq!(code, 1);
    assert!(stdout.contains("  --> ./.locsyncrc.json:1:1"), "{stdout}");
    assert!(
        stdout.contains("targets[0]: Code directory 'missing' does not exist."),
        "{stdout}"
    );
    assert!(
        stdout.contains("targets[1]: Incomplete target definition."),
        "{stdout}"
    );
    Ok(())
}

#[test]
fn test_check_source_root_argument() -> Result<()> {
    let test = CliTest::with_files(&[
        ("proj/src/app.py", "_(\"hello\")\n"),
        ("proj/locales/en.po", EN_PO),
    ])?;

    let mut cmd = test.command();
    cmd.args(["check", "--source-root", "proj"]);
    let (code, stdout, _) = run(cmd)?;

    assert_eq!(code, 0, "{stdout}");
    assert!(stdout.contains("no problems found"), "{stdout}");
    Ok(())
}

#[test]
fn test_check_invalid_config_is_an_error() -> Result<()> {
    let test = CliTest::with_files(&[(".locsyncrc.json", "{ not json")])?;

    let (code, _, stderr) = run(test.check_command())?;

    assert_eq!(code, 2);
    assert!(stderr.contains("Failed to parse config file"), "{stderr}");
    Ok(())
}
