use phf::{Map, phf_map};
use std::fmt::Write;
use tracing::warn;

/// Organism labels for taxonomy identifiers that commonly appear in `OX=` tags.
static KNOWN_ORGANISMS: Map<u32, &'static str> = phf_map! {
    9606u32 => "Homo sapiens",
    10090u32 => "Mus musculus",
    10116u32 => "Rattus norvegicus",
    3702u32 => "Arabidopsis thaliana",
    559292u32 => "Saccharomyces cerevisiae",
    83333u32 => "Escherichia coli",
    7227u32 => "Drosophila melanogaster",
    6239u32 => "Caenorhabditis elegans",
    7955u32 => "Danio rerio",
};

pub fn organism_label(taxon_id: u32) -> Option<&'static str> {
    KNOWN_ORGANISMS.get(&taxon_id).copied()
}

/// A parsed UniProt-style FASTA header: `db|accession|entryName Name KEY=VALUE ...`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FastaHeader {
    pub database: String,
    pub accession: String,
    pub entry_name: String,
    pub protein_name: String,
    pub organism: Option<String>,
    pub organism_id: Option<u32>,
    pub gene_name: Option<String>,
    pub protein_existence: Option<u8>,
    pub sequence_version: Option<u32>,
    pub abundance: Option<f64>,
    pub modified: bool,
}

impl FastaHeader {
    /// Parses a header line, with or without the leading `>`.
    ///
    /// Parsing never fails: unrecognized keys are ignored and malformed values leave the
    /// field at its default.
    pub fn parse(line: &str) -> Self {
        let line = line.trim().trim_start_matches('>').trim();
        let mut header = FastaHeader::default();

        let (identifier, rest) = match line.split_once(char::is_whitespace) {
            Some((id, rest)) => (id, rest),
            None => (line, ""),
        };

        let fields: Vec<&str> = identifier.split('|').collect();
        match fields.as_slice() {
            [db, accession, entry_name, ..] => {
                header.database = db.to_string();
                header.accession = accession.to_string();
                header.entry_name = entry_name.to_string();
            }
            [accession, entry_name] => {
                header.accession = accession.to_string();
                header.entry_name = entry_name.to_string();
            }
            _ => {
                header.accession = identifier.to_string();
                header.entry_name = identifier.to_string();
            }
        }

        let mut name_words: Vec<&str> = Vec::new();
        let mut tags: Vec<(&str, String)> = Vec::new();
        for token in rest.split_whitespace() {
            match token.split_once('=') {
                Some((key, value)) if is_tag_key(key) => tags.push((key, value.to_string())),
                _ => match tags.last_mut() {
                    Some((_, value)) => {
                        value.push(' ');
                        value.push_str(token);
                    }
                    None => name_words.push(token),
                },
            }
        }
        header.protein_name = name_words.join(" ");

        for (key, value) in tags {
            header.apply_tag(key, &value);
        }

        if header.organism.is_none() {
            header.organism = header
                .organism_id
                .and_then(organism_label)
                .map(str::to_string);
        }
        header
    }

    fn apply_tag(&mut self, key: &str, value: &str) {
        match key {
            "OS" => self.organism = Some(value.to_string()),
            "OX" => self.organism_id = parse_or_warn(key, value, &self.entry_name),
            "GN" => self.gene_name = Some(value.to_string()),
            "PE" => self.protein_existence = parse_or_warn(key, value, &self.entry_name),
            "SV" => self.sequence_version = parse_or_warn(key, value, &self.entry_name),
            "AB" => {
                self.abundance = parse_or_warn::<f64>(key, value, &self.entry_name)
                    .filter(|v| v.is_finite() && *v >= 0.0);
            }
            "MD" => {
                self.modified = parse_or_warn::<bool>(key, &value.to_ascii_lowercase(), &self.entry_name)
                    .unwrap_or(false);
            }
            _ => {}
        }
    }

    /// Renders the header line, including the leading `>`.
    pub fn to_line(&self) -> String {
        let mut line = String::from(">");
        if self.database.is_empty() && self.accession == self.entry_name {
            line.push_str(&self.entry_name);
        } else {
            let _ = write!(line, "{}|{}|{}", self.database, self.accession, self.entry_name);
        }
        if !self.protein_name.is_empty() {
            let _ = write!(line, " {}", self.protein_name);
        }
        if let Some(organism) = &self.organism {
            let _ = write!(line, " OS={}", organism);
        }
        if let Some(id) = self.organism_id {
            let _ = write!(line, " OX={}", id);
        }
        if let Some(gene) = &self.gene_name {
            let _ = write!(line, " GN={}", gene);
        }
        if let Some(pe) = self.protein_existence {
            let _ = write!(line, " PE={}", pe);
        }
        if let Some(sv) = self.sequence_version {
            let _ = write!(line, " SV={}", sv);
        }
        let _ = write!(
            line,
            " AB={} MD={}",
            self.abundance.unwrap_or(0.0),
            self.modified
        );
        line
    }
}

fn is_tag_key(key: &str) -> bool {
    key.len() == 2 && key.chars().all(|c| c.is_ascii_uppercase())
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, value: &str, entry_name: &str) -> Option<T> {
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(
                "Ignoring malformed header tag {}='{}' for entry '{}'.",
                key, value, entry_name
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALBUMIN: &str = ">sp|P02768|ALBU_HUMAN Albumin OS=Homo sapiens OX=9606 GN=ALB PE=1 SV=2 AB=40.0";

    #[test]
    fn parses_uniprot_header_with_multi_word_values() {
        let header = FastaHeader::parse(ALBUMIN);
        assert_eq!(header.database, "sp");
        assert_eq!(header.accession, "P02768");
        assert_eq!(header.entry_name, "ALBU_HUMAN");
        assert_eq!(header.protein_name, "Albumin");
        assert_eq!(header.organism.as_deref(), Some("Homo sapiens"));
        assert_eq!(header.organism_id, Some(9606));
        assert_eq!(header.gene_name.as_deref(), Some("ALB"));
        assert_eq!(header.protein_existence, Some(1));
        assert_eq!(header.sequence_version, Some(2));
        assert_eq!(header.abundance, Some(40.0));
        assert!(!header.modified);
    }

    #[test]
    fn known_taxon_sets_organism_label_when_os_is_missing() {
        let header = FastaHeader::parse("sp|P1|X_MOUSE Thing OX=10090");
        assert_eq!(header.organism.as_deref(), Some("Mus musculus"));
        let header = FastaHeader::parse("sp|P1|X_ALIEN Thing OX=424242");
        assert!(header.organism.is_none());
        assert_eq!(header.organism_id, Some(424242));
    }

    #[test]
    fn malformed_and_unknown_tags_degrade_to_defaults() {
        let header = FastaHeader::parse("sp|P1|X_HUMAN Thing AB=lots PE=? ZZ=unused SV=3 MD=maybe");
        assert_eq!(header.abundance, None);
        assert_eq!(header.protein_existence, None);
        assert_eq!(header.sequence_version, Some(3));
        assert!(!header.modified);
    }

    #[test]
    fn negative_abundance_is_discarded() {
        let header = FastaHeader::parse("sp|P1|X_HUMAN AB=-2.0");
        assert_eq!(header.abundance, None);
    }

    #[test]
    fn header_without_pipes_uses_first_token_as_identity() {
        let header = FastaHeader::parse(">MYPROT some description AB=1.5");
        assert_eq!(header.entry_name, "MYPROT");
        assert_eq!(header.accession, "MYPROT");
        assert_eq!(header.protein_name, "some description");
        assert_eq!(header.abundance, Some(1.5));
    }

    #[test]
    fn rendered_line_parses_back_to_the_same_header() {
        let mut header = FastaHeader::parse(ALBUMIN);
        header.modified = true;
        let reparsed = FastaHeader::parse(&header.to_line());
        assert_eq!(reparsed, header);
    }
}
