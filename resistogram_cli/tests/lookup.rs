mod common;

use clap::Parser;
use resistogram_cli::Commands;
use resistogram_cli::OutputFormat;
use resistogram_cli::ResistCli;
use resistogram_core::AnyEmptyResult;
use rstest::rstest;
use serde_json::Value;

#[rstest]
#[case::class("penicillins", "AMX, PIP")]
#[case::synonym("Amoxi", "AMX")]
#[case::short_name("cipro", "CIP")]
#[case::all("all", "AMX, PIP, CIP")]
fn lookup_resolves_antibiotics(#[case] param: &str, #[case] expected: &str) -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_dataset(tmp.path())?;

	common::resistogram_cmd()
		.arg("lookup")
		.arg("--abx")
		.arg(param)
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains(format!("resolved:    {expected}\n")));

	Ok(())
}

#[test]
fn lookup_detects_organisms_in_text() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_dataset(tmp.path())?;

	common::resistogram_cmd()
		.arg("lookup")
		.arg("--org")
		.arg("auto")
		.arg("--text")
		.arg("Infections caused by *E. coli* and Klebsiella pneumoniae")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("resolved:    E_COLI, K_PNEU"));

	Ok(())
}

#[test]
fn lookup_outputs_json() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_dataset(tmp.path())?;

	let output = common::resistogram_cmd()
		.arg("lookup")
		.arg("--org")
		.arg("ESBL producers, unknown bug")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(tmp.path())
		.output()?;
	assert!(output.status.success());

	let json: Value = serde_json::from_slice(&output.stdout)?;
	similar_asserts::assert_eq!(
		json,
		serde_json::json!({
			"resolved": ["E_COLI", "K_PNEU"],
			"unresolved": ["unknown bug"],
		})
	);

	Ok(())
}

#[test]
fn lookup_requires_exactly_one_parameter() {
	common::resistogram_cmd().arg("lookup").assert().code(2);
	common::resistogram_cmd()
		.args(["lookup", "--abx", "AMX", "--org", "E_COLI"])
		.assert()
		.code(2);
}

#[test]
fn lookup_arguments_parse() -> AnyEmptyResult {
	let cli = ResistCli::try_parse_from([
		"resistogram",
		"lookup",
		"--org",
		"auto",
		"--text",
		"E. coli",
		"--format",
		"json",
	])?;

	let Some(Commands::Lookup {
		abx,
		org,
		text,
		format,
	}) = cli.command
	else {
		panic!("expected lookup command");
	};
	assert_eq!(abx, None);
	assert_eq!(org.as_deref(), Some("auto"));
	assert_eq!(text.as_deref(), Some("E. coli"));
	assert_eq!(format, OutputFormat::Json);

	Ok(())
}
