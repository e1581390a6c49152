use std::path::Path;

use crate::merge::InMemoryTables;
use crate::records::ClassRecord;
use crate::records::EntityRecord;
use crate::records::GroupRecord;
use crate::records::LocalizedNames;
use crate::records::ReferenceTables;
use crate::records::ResistanceRow;
use crate::records::Source;
use crate::records::SourceLabels;

pub fn antibiotics() -> Vec<EntityRecord> {
	vec![
		EntityRecord::new("AMX").in_class("PENICILLINS").named(
			"de",
			LocalizedNames::full("Amoxicillin").with_synonyms("Amoxi;broad spectrum"),
		),
		EntityRecord::new("PIP")
			.in_class("PENICILLINS")
			.named("de", LocalizedNames::full("Piperacillin").with_short("Pip.")),
		EntityRecord::new("CIP")
			.in_class("FLUOROQUINOLONES")
			.named("de", LocalizedNames::full("Ciprofloxacin").with_short("Cipro")),
		EntityRecord::new("LVX")
			.in_class("FLUOROQUINOLONES")
			.named("de", LocalizedNames::full("Levofloxacin")),
		EntityRecord::new("XYZ").named("de", LocalizedNames::full("Xyzomycin")),
	]
}

pub fn antibiotic_classes() -> Vec<ClassRecord> {
	vec![
		ClassRecord::new("PENICILLINS")
			.named("de", LocalizedNames::full("Penicilline"))
			.named("en", LocalizedNames::full("Penicillins")),
		ClassRecord::new("FLUOROQUINOLONES")
			.named("de", LocalizedNames::full("Fluorchinolone"))
			.named(
				"en",
				LocalizedNames::full("Fluoroquinolones").with_synonyms("FQ;broad spectrum"),
			),
		ClassRecord::new("GLYCOPEPTIDES").named("en", LocalizedNames::full("Glycopeptides")),
	]
}

pub fn organisms() -> Vec<EntityRecord> {
	vec![
		EntityRecord::new("E_COLI")
			.in_class("ENTERO")
			.in_groups(["ESBL_PROD", "UTI"])
			.named(
				"en",
				LocalizedNames::full("Escherichia coli")
					.with_short("E. coli")
					.with_synonyms("Coliforms"),
			),
		EntityRecord::new("K_PNEU")
			.in_class("ENTERO")
			.in_groups(["ESBL_PROD"])
			.named(
				"en",
				LocalizedNames::full("Klebsiella pneumoniae").with_short("K. pneumoniae"),
			),
		EntityRecord::new("P_AERU")
			.in_class("GRAM_NEG")
			.in_groups(["UTI"])
			.named(
				"en",
				LocalizedNames::full("Pseudomonas aeruginosa")
					.with_synonyms("Pseudomonas;Gram-negative rods"),
			),
		EntityRecord::new("S_AUR").in_class("STAPH").named(
			"en",
			LocalizedNames::full("Staphylococcus aureus").with_synonyms("MSSA"),
		),
		EntityRecord::new("UNCLASSED").named("en", LocalizedNames::full("Unclassified bug")),
	]
}

pub fn organism_classes() -> Vec<ClassRecord> {
	vec![
		ClassRecord::new("GRAM_NEG").named("en", LocalizedNames::full("Gram-negative bacteria")),
		ClassRecord::new("ENTERO").under("GRAM_NEG").named(
			"en",
			LocalizedNames::full("Enterobacterales")
				.with_synonyms("Enterobacteria;Gram-negative rods"),
		),
		ClassRecord::new("GRAM_POS").named("en", LocalizedNames::full("Gram-positive bacteria")),
		ClassRecord::new("STAPH")
			.under("GRAM_POS")
			.named("en", LocalizedNames::full("Staphylococci")),
	]
}

pub fn organism_groups() -> Vec<GroupRecord> {
	vec![
		GroupRecord::new("ESBL_PROD").named("en", LocalizedNames::full("ESBL producers")),
		GroupRecord::new("UTI").named(
			"en",
			LocalizedNames::full("Urinary tract pathogens").with_synonyms("Coliforms"),
		),
		GroupRecord::new("EMPTY").named("en", LocalizedNames::full("Empty group")),
	]
}

/// Sources A to E: A is a 2022 root with children B and C (2023), D is a
/// 2023 child of B and E a 2024 root.
pub fn scenario_sources() -> Vec<Source> {
	vec![
		Source::new("A", Some(2022)).labelled("de", SourceLabels::named("Nationale Surveillance")),
		Source::new("B", Some(2023))
			.under("A")
			.labelled("de", SourceLabels::named("Regional Nord")),
		Source::new("C", Some(2023))
			.under("A")
			.labelled("de", SourceLabels::named("Regional Sued")),
		Source::new("D", Some(2023))
			.under("B")
			.labelled("de", SourceLabels::named("Klinikum Nord")),
		Source::new("E", Some(2024)).labelled("de", SourceLabels::named("Neue Erhebung")),
	]
}

pub fn reference_tables() -> ReferenceTables {
	ReferenceTables {
		antibiotics: antibiotics(),
		organisms: organisms(),
		antibiotic_classes: antibiotic_classes(),
		organism_classes: organism_classes(),
		organism_groups: organism_groups(),
		sources: scenario_sources(),
	}
}

/// A root with two children, the first of which has a child of its own.
pub fn merge_sources() -> Vec<Source> {
	vec![
		Source::new("ROOT", Some(2020)),
		Source::new("CHILD1", Some(2021)).under("ROOT"),
		Source::new("CHILD2", Some(2021)).under("ROOT"),
		Source::new("GRANDCHILD1", Some(2022)).under("CHILD1"),
	]
}

pub fn merge_tables() -> InMemoryTables {
	InMemoryTables::new()
		.with_rows(
			"ROOT",
			vec![
				ResistanceRow::new("PEN", "E_COLI", Some(10.0)).with_isolates(100),
				ResistanceRow::new("AMX", "E_COLI", Some(20.0)).with_isolates(200),
				ResistanceRow::new("CIP", "E_COLI", Some(30.0)),
			],
		)
		.with_rows(
			"CHILD1",
			vec![ResistanceRow::new("AMX", "E_COLI", Some(25.0)).with_isolates(50)],
		)
		.with_rows(
			"CHILD2",
			vec![ResistanceRow::new("PEN", "E_COLI", Some(99.0))],
		)
		.with_rows(
			"GRANDCHILD1",
			vec![
				ResistanceRow::new("CIP", "E_COLI", Some(35.0)),
				ResistanceRow::new("PEN", "K_PNEU", Some(5.0)),
			],
		)
}

pub const ANTIBIOTICS_CSV: &str = "\u{feff}amr_code,class,name_de,name_en,short_name_de,synonyms_de
AMX,PENICILLINS,Amoxicillin,Amoxicillin,,Amoxi
CIP,FLUOROQUINOLONES,Ciprofloxacin,Ciprofloxacin,Cipro,
XYZ,,Xyzomycin,,,
";

pub const ORGANISMS_CSV: &str = "amr_code,class_id,groups,name_de,name_en,short_name_en,synonyms_en
E_COLI,ENTERO,ESBL_PROD; UTI,Escherichia coli,Escherichia coli,E. coli,Coliforms
S_AUR,STAPH,,Staphylococcus aureus,Staphylococcus aureus,S. aureus,MSSA
,ENTERO,,Missing identifier,,,
";

pub const ANTIBIOTIC_CLASSES_CSV: &str = "id,name_de,name_en
PENICILLINS,Penicilline,Penicillins
FLUOROQUINOLONES,Fluorchinolone,Fluoroquinolones
";

pub const ORGANISM_CLASSES_CSV: &str = "id,parent_id,name_de,name_en
GRAM_NEG,,Gramnegative,Gram-negative bacteria
ENTERO,GRAM_NEG,Enterobakterien,Enterobacterales
GRAM_POS,,Grampositive,Gram-positive bacteria
STAPH,GRAM_POS,Staphylokokken,Staphylococci
";

pub const ORGANISM_GROUPS_CSV: &str = "id,name_de,name_en
ESBL_PROD,ESBL-Bildner,ESBL producers
";

pub const SOURCES_CSV: &str = "id,parent_id,year,name_de,source_file,source_url
NATIONAL,,2022,Nationale Surveillance,national.csv,https://example.org/national
NATIONAL_2023,NATIONAL,2023,Nationale Surveillance 2023,national_2023.csv,
CLINIC,NATIONAL_2023,2023,Klinikum Nord,clinic.csv,
";

pub const NATIONAL_CSV: &str = "antibiotic_id,organism_id,resistance_pct,n_isolates
AMX,E_COLI,40.5,1200
CIP,E_COLI,20,1100
AMX,S_AUR,n/a,300
";

pub const NATIONAL_2023_CSV: &str = "antibiotic_id,organism_id,resistance_pct,n_isolates
AMX,E_COLI,42,1300
";

pub const CLINIC_CSV: &str = "antibiotic_id,organism_id,resistance_pct,n_isolates,note
CIP,E_COLI,25%,80,small sample
";

/// Write the CSV dataset into `root/data` with default file names.
pub fn write_dataset(root: &Path) {
	let data = root.join("data");
	std::fs::create_dir_all(&data).unwrap_or_else(|e| panic!("create data dir: {e}"));

	for (name, content) in [
		("antibiotics.csv", ANTIBIOTICS_CSV),
		("organisms.csv", ORGANISMS_CSV),
		("antibiotic_classes.csv", ANTIBIOTIC_CLASSES_CSV),
		("organism_classes.csv", ORGANISM_CLASSES_CSV),
		("organism_groups.csv", ORGANISM_GROUPS_CSV),
		("data_sources.csv", SOURCES_CSV),
		("national.csv", NATIONAL_CSV),
		("national_2023.csv", NATIONAL_2023_CSV),
		("clinic.csv", CLINIC_CSV),
	] {
		std::fs::write(data.join(name), content).unwrap_or_else(|e| panic!("write {name}: {e}"));
	}
}

pub fn strings(values: &[&str]) -> Vec<String> {
	values.iter().map(ToString::to_string).collect()
}
