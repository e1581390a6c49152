mod common;

use predicates::prelude::PredicateBooleanExt;
use resistogram_core::AnyEmptyResult;
use serde_json::Value;

const GUIDE: &str = "# Guide

Amoxicillin works against E. coli.

%%RESIST abx=auto org=auto%%
";

#[test]
fn resolve_prints_table_components() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_dataset(tmp.path())?;
	common::write_file(tmp.path(), "docs/guide.md", GUIDE)?;
	common::write_file(tmp.path(), "docs/plain.md", "# No tables here\n")?;

	common::resistogram_cmd()
		.arg("resolve")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("docs/guide.md"))
		.stdout(predicates::str::contains(
			"5:1 <ResistanceTable antibioticIds='[\"AMX\"]' organismIds='[\"E_COLI\"]' \
			 unresolvedAbx='[]' unresolvedOrg='[]' dataSourceId='CLINIC' pluginId='default' \
			 abx='auto' org='auto' />",
		))
		.stdout(predicates::str::contains("docs/plain.md").not())
		.stdout(predicates::str::contains("Resolved 1 directive(s) in 1 file(s)."));

	Ok(())
}

#[test]
fn resolve_outputs_json() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_dataset(tmp.path())?;
	common::write_file(tmp.path(), "docs/guide.md", GUIDE)?;
	common::write_file(
		tmp.path(),
		"docs/sources.md",
		"%%RESIST abx=\"Amoxicillin\", cip org=E_COLI source=2022 caption=Older data%%\n",
	)?;

	let output = common::resistogram_cmd()
		.arg("resolve")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(tmp.path())
		.output()?;
	assert!(output.status.success());

	let json: Value = serde_json::from_slice(&output.stdout)?;
	let documents = json.as_array().ok_or("expected an array")?;
	assert_eq!(documents.len(), 2);

	assert_eq!(documents[0]["file"], "docs/guide.md");
	let guide = &documents[0]["directives"][0];
	assert_eq!(guide["antibioticIds"], serde_json::json!(["AMX"]));
	assert_eq!(guide["organismIds"], serde_json::json!(["E_COLI"]));
	assert_eq!(guide["dataSourceId"], "CLINIC");
	assert_eq!(guide["line"], 5);

	assert_eq!(documents[1]["file"], "docs/sources.md");
	let sources = &documents[1]["directives"][0];
	assert_eq!(sources["antibioticIds"], serde_json::json!(["AMX", "CIP"]));
	assert_eq!(sources["dataSourceId"], "NATIONAL");
	assert_eq!(sources["params"]["caption"], serde_json::json!(["Older data"]));

	Ok(())
}

#[test]
fn resolve_only_given_files() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_dataset(tmp.path())?;
	common::write_file(tmp.path(), "docs/guide.md", GUIDE)?;
	common::write_file(tmp.path(), "docs/other.md", "%%RESIST abx=all org=all%%\n")?;

	common::resistogram_cmd()
		.arg("resolve")
		.arg("--path")
		.arg(tmp.path())
		.arg(tmp.path().join("docs/other.md"))
		.assert()
		.success()
		.stdout(predicates::str::contains("docs/other.md"))
		.stdout(predicates::str::contains("antibioticIds='[\"AMX\",\"PIP\",\"CIP\"]'"))
		.stdout(predicates::str::contains("docs/guide.md").not());

	Ok(())
}

#[test]
fn resolve_respects_exclude_patterns() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_dataset(tmp.path())?;
	common::write_file(tmp.path(), "docs/guide.md", GUIDE)?;
	common::write_file(tmp.path(), "drafts/wip.md", GUIDE)?;
	common::write_file(
		tmp.path(),
		"resistogram.toml",
		"[exclude]\npatterns = [\"drafts/\"]\n",
	)?;

	common::resistogram_cmd()
		.arg("resolve")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("drafts/wip.md").not())
		.stdout(predicates::str::contains("Resolved 1 directive(s) in 1 file(s)."));

	Ok(())
}

#[test]
fn resolve_reports_unresolved_tokens() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_dataset(tmp.path())?;
	common::write_file(tmp.path(), "page.md", "%%RESIST abx=nonsense,AMX org=E_COLI%%\n")?;

	common::resistogram_cmd()
		.arg("resolve")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("unresolvedAbx='[\"nonsense\"]'"))
		.stdout(predicates::str::contains("1 directive(s) contain unresolved tokens."))
		.stderr(predicates::str::contains(
			"unresolved antibiotic token(s): nonsense",
		));

	Ok(())
}

#[test]
fn resolve_strict_fails_on_unresolved_tokens() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_dataset(tmp.path())?;
	common::write_file(tmp.path(), "page.md", "%%RESIST abx=AMX org=nowhere%%\n")?;

	common::resistogram_cmd()
		.arg("resolve")
		.arg("--strict")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(predicates::str::contains("unresolved organism token(s): nowhere"));

	Ok(())
}

#[test]
fn resolve_strict_passes_when_everything_resolves() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_dataset(tmp.path())?;
	common::write_file(tmp.path(), "docs/guide.md", GUIDE)?;

	common::resistogram_cmd()
		.arg("resolve")
		.arg("--strict")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	Ok(())
}

#[test]
fn resolve_without_directives() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_dataset(tmp.path())?;
	common::write_file(tmp.path(), "readme.md", "# Nothing to see\n")?;

	common::resistogram_cmd()
		.arg("resolve")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("No directives found."));

	Ok(())
}

#[test]
fn missing_data_directory_produces_no_tables() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "docs/guide.md", GUIDE)?;

	common::resistogram_cmd()
		.arg("resolve")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("No directives found."))
		.stdout(predicates::str::contains("<ResistanceTable").not())
		.stderr(predicates::str::contains("reference data directory not found"))
		.stderr(predicates::str::contains(
			"reference data unavailable, no tables will be produced",
		));

	Ok(())
}

#[test]
fn missing_data_directory_is_not_strict_failure() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "docs/guide.md", GUIDE)?;

	common::resistogram_cmd()
		.arg("resolve")
		.arg("--strict")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::diff("[]\n"));

	Ok(())
}

#[test]
fn invalid_config_is_an_error() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_dataset(tmp.path())?;
	common::write_file(tmp.path(), "resistogram.toml", "locales = ")?;

	common::resistogram_cmd()
		.arg("resolve")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("failed to parse config file"));

	Ok(())
}

#[test]
fn missing_subcommand_exits_with_one() {
	common::resistogram_cmd()
		.assert()
		.code(1)
		.stderr(predicates::str::contains("No subcommand specified"));
}
