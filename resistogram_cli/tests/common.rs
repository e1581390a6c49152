#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn resistogram_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("resistogram"));
	cmd.env("NO_COLOR", "1");
	cmd.env_remove("RUST_LOG");
	cmd
}

const ANTIBIOTICS_CSV: &str = "amr_code,class,name_de,name_en,short_name_de,synonyms_de
AMX,PENICILLINS,Amoxicillin,Amoxicillin,,Amoxi
PIP,PENICILLINS,Piperacillin,Piperacillin,,
CIP,FLUOROQUINOLONES,Ciprofloxacin,Ciprofloxacin,Cipro,
";

const ORGANISMS_CSV: &str = "amr_code,class_id,groups,name_en,short_name_en
E_COLI,ENTERO,ESBL_PROD,Escherichia coli,E. coli
K_PNEU,ENTERO,ESBL_PROD,Klebsiella pneumoniae,K. pneumoniae
S_AUR,STAPH,,Staphylococcus aureus,S. aureus
";

const ANTIBIOTIC_CLASSES_CSV: &str = "id,name_de,name_en
PENICILLINS,Penicilline,Penicillins
FLUOROQUINOLONES,Fluorchinolone,Fluoroquinolones
";

const ORGANISM_CLASSES_CSV: &str = "id,parent_id,name_en
GRAM_POS,,Gram-positive bacteria
STAPH,GRAM_POS,Staphylococci
GRAM_NEG,,Gram-negative bacteria
ENTERO,GRAM_NEG,Enterobacterales
";

const ORGANISM_GROUPS_CSV: &str = "id,name_en
ESBL_PROD,ESBL producers
";

const SOURCES_CSV: &str = "id,parent_id,year,name_de,source_file
NATIONAL,,2022,Nationale Surveillance,national.csv
CLINIC,NATIONAL,2023,Klinikum Nord,clinic.csv
";

const NATIONAL_CSV: &str = "antibiotic_id,organism_id,resistance_pct,n_isolates
AMX,E_COLI,40.5,1200
CIP,E_COLI,20,1100
AMX,S_AUR,12,300
PIP,K_PNEU,8,90
";

const CLINIC_CSV: &str = "antibiotic_id,organism_id,resistance_pct,n_isolates
CIP,E_COLI,25,80
";

/// Write a small reference dataset into `root/data`.
pub fn write_dataset(root: &Path) -> std::io::Result<()> {
	let data = root.join("data");
	std::fs::create_dir_all(&data)?;

	for (name, content) in [
		("antibiotics.csv", ANTIBIOTICS_CSV),
		("organisms.csv", ORGANISMS_CSV),
		("antibiotic_classes.csv", ANTIBIOTIC_CLASSES_CSV),
		("organism_classes.csv", ORGANISM_CLASSES_CSV),
		("organism_groups.csv", ORGANISM_GROUPS_CSV),
		("data_sources.csv", SOURCES_CSV),
		("national.csv", NATIONAL_CSV),
		("clinic.csv", CLINIC_CSV),
	] {
		std::fs::write(data.join(name), content)?;
	}

	Ok(())
}

/// Write `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) -> std::io::Result<()> {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent)?;
	}

	std::fs::write(path, content)
}
