//! Zero-cost keyword/pattern classification of raw organization name
//! strings. No network calls — runs before fuzzy or LLM matching, same as
//! the keyword tables it reproduces.
//!
//! Categories are tried in priority order and the first match wins, the
//! same short-circuit-on-first-terminal-outcome idiom the matcher cascade
//! (and the guardrail pipeline it was adapted from) uses: `un_system` is
//! checked before `intergovernmental`, `intergovernmental` before
//! `national_government`, and so on down to the `other` catch-all.

use std::sync::OnceLock;

use serde::Serialize;

/// The seven organization categories, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    UnSystem,
    Intergovernmental,
    NationalGovernment,
    University,
    Ngo,
    Private,
    Other,
}

impl Category {
    pub fn meta_type(self) -> &'static str {
        match self {
            Category::UnSystem | Category::Intergovernmental => "io",
            Category::NationalGovernment => "gov",
            Category::University => "university",
            Category::Ngo => "ngo",
            Category::Private => "private",
            Category::Other => "other",
        }
    }

    /// The ontology subset to search for this category, or `None` to
    /// search everything.
    pub fn search_meta_type(self) -> Option<&'static str> {
        match self {
            Category::UnSystem | Category::Intergovernmental => Some("io"),
            Category::NationalGovernment => Some("gov"),
            Category::University => Some("university"),
            Category::Ngo | Category::Private | Category::Other => None,
        }
    }

    pub fn sector(self) -> &'static str {
        match self {
            Category::UnSystem | Category::Intergovernmental => "intergovernmental",
            Category::NationalGovernment => "government",
            Category::University => "academia",
            Category::Ngo => "ngo",
            Category::Private => "private",
            Category::Other => "other",
        }
    }

    /// The `org_types` tag array stamped onto a newly created ontology
    /// stub for this category.
    pub fn org_types(self) -> &'static [&'static str] {
        match self {
            Category::UnSystem => &["international_organization"],
            Category::Intergovernmental => &["intergovernmental_organization"],
            Category::NationalGovernment => &["government"],
            Category::University => &["university"],
            Category::Ngo => &["ngo"],
            Category::Private => &["private_sector"],
            Category::Other => &["other"],
        }
    }
}

const UN_KEYWORDS: &[&str] = &[
    "united nations", "un ", " un ", "(un)", "un-", "un:",
    "undp", "unicef", "unesco", "who ", "unhcr", "wfp", "unfpa",
    "ilo", "fao", "iaea", "imo ", "itu ", "wmo", "wipo", "ifad",
    "unep", "unctad", "unaids", "unops", "unido", "unwomen", "un women",
    "unodc", "ohchr", "ocha", "unrwa", "unhabitat", "habitat ",
    "secretary-general", "secretary general",
    "general assembly", "security council", "ecosoc",
    "economic and social council", "trusteeship council",
    "un secretariat", "office of the united nations",
    "world food programme", "world health organization",
    "international labour", "food and agriculture organization",
    "international atomic energy",
    "un high commissioner", "high commissioner for refugees",
    "international maritime organization",
    "international telecommunication union",
    "world meteorological organization",
    "world intellectual property",
    "international fund for agricultural",
    "un environment programme",
    "un conference on trade",
    "joint united nations programme",
];

const INTERGOVERNMENTAL_KEYWORDS: &[&str] = &[
    "world bank", "international monetary fund", " imf", "imf ",
    "nato", "north atlantic treaty",
    "european union", " eu ", "(eu)", "council of the european",
    "african union", " au ", "african development bank",
    "asian development bank", "inter-american development bank",
    "islamic development bank",
    "oecd", "organisation for economic co-operation",
    "wto", "world trade organization",
    "g7 ", "g8 ", "g20 ", " g7", " g8", " g20",
    "commonwealth of nations", "british commonwealth",
    "organization of american states", " oas",
    "arab league", "league of arab states",
    "council of europe",
    "apec", "asean", "sco ", "brics",
    "international criminal court", " icc ",
    "international court of justice",
    "bank for international settlements",
    "international finance corporation",
    "multilateral investment guarantee",
    "international development association",
    "international bank for reconstruction",
    "european central bank",
    "european commission", "european parliament", "european council",
    "organization for security and co-operation",
    "organisation of islamic cooperation",
    "economic community of west african",
    "southern african development community",
    "association of southeast asian",
    "shanghai cooperation",
    "mercosur", "mercosul",
    "gulf cooperation council",
    "caribbean community", "caricom",
    "pacific islands forum",
    "intergovernmental panel on climate",
    " ipcc",
];

const NATIONAL_GOV_KEYWORDS: &[&str] = &[
    "parliament", "parliamentary",
    "ministry", "minister of",
    "cabinet of", "state cabinet",
    "government of", "govt of",
    "presidency", "president of",
    "prime minister", "premier of",
    "chancellor of",
    "senate ", "congress ",
    "national assembly", "legislative assembly",
    "house of representatives", "house of commons", "house of lords",
    "department of ",
    "federal government", "federal ministry",
    "national government",
    "royal government",
    "imperial government",
    "ambassador", "embassy", "high commission",
    "consulate",
    "foreign affairs", "foreign ministry",
    "central bank of", "bank of england", "bank of japan",
    "bank of canada", "bank of australia", "bank of russia",
    "bank of china", "bank of india", "bank of mexico",
    "bank of korea", "banque de france", "bundesbank",
    "reserve bank", "national bank of",
    "supreme court of", "constitutional court",
    "armed forces", "military of",
    "department of defense", "ministry of defense", "ministry of defence",
    "national security",
    "state department",
    "whitehall",
    "10 downing street", "number 10",
    "élysée", "elysée",
    "kremlin",
    "capitol hill",
    "provincial government", "state government",
    "municipality", "city government", "city council",
    "nth parliament", "1st parliament", "2nd parliament", "3rd parliament",
    "4th parliament", "5th parliament", "6th parliament", "7th parliament",
    "8th parliament", "9th parliament",
];

const UNIVERSITY_KEYWORDS: &[&str] = &[
    "university", "université", "universität", "universiteit",
    "universidad", "università", "universidade",
    "college of ", "college,", " college",
    "institute of technology",
    "school of business", "school of law", "school of medicine",
    "school of public", "school of economics",
    "faculty of",
    "polytechnic",
    "conservatory",
    "seminary",
    "graduate school",
    "business school",
    "law school",
    "medical school",
    "dental school",
    "engineering school",
    "madrasa", "madrasah",
    "ecole ", "école ",
    "hochschule",
    "fachhochschule",
];

const NGO_KEYWORDS: &[&str] = &[
    "foundation",
    "think tank",
    "institute for",
    "institute of international",
    "institute on",
    "council on ",
    "council for ",
    "center for", "centre for",
    "research institute",
    "research center", "research centre",
    "international committee",
    "international federation",
    "international alliance",
    "red cross", "red crescent",
    "amnesty international",
    "oxfam",
    "greenpeace",
    "médecins sans frontières", "doctors without borders",
    "human rights watch",
    "transparency international",
    "save the children",
    "world wildlife fund", "wwf",
    "care international",
    "action aid",
    "programme for ",
    "program for ",
    "alliance for ",
    "partnership for ",
    "global fund",
    "initiative for ",
    "campaign for ",
    "society for ",
    "association for ",
    "federation of ",
    "network of ",
    "coalition for ",
    "forum for ",
    "platform for ",
    "lab for ", " poverty action lab",
    "policy lab",
    "brookings", "rand corporation", "chatham house",
    "carnegie endowment", "wilson center",
    "peterson institute",
    "atlantic council",
    "council of foreign relations", "council on foreign relations",
    "international crisis group",
    "transparency", "accountability",
    "africa-america institute",
    "non-governmental", "ngo",
];

const PRIVATE_KEYWORDS: &[&str] = &[
    " inc.", " inc,", " incorporated",
    " corp.", " corporation",
    " ltd.", " limited",
    " llc", " llp",
    " plc",
    " s.a.", " s.a,",
    " gmbh",
    " ag ",
    " n.v.",
    " p.l.c",
    "holdings",
    "group plc", "group inc", "group corp",
    " consulting", " consultancy",
    " advisory",
    "media group", "news group",
    "broadcasting corporation", "television network",
    "newspaper", "magazine", " press",
    "bank ",
    "financial services",
    "investment bank", "investment firm",
    "hedge fund", "private equity",
    "venture capital",
    "pharmaceutical", "pharmaceuticals",
    "oil company", "energy company",
    "telecommunications",
    "technology company", "tech company",
    "carlton", "reuters", "bloomberg",
    "mckinsey", "bain ", "bcg ",
    "deloitte", "pwc", "ernst & young", "kpmg",
    "goldman sachs", "morgan stanley", "jp morgan", "jpmorgan",
    "citibank", "citigroup", "barclays", "hsbc", "deutsche bank",
    "ubs ", "credit suisse",
];

/// Strings that start with a private keyword but should NOT be classified
/// private — mostly multilateral development banks that also contain "bank".
const PRIVATE_EXCLUSIONS: &[&str] = &[
    "world bank",
    "central bank",
    "bank of england", "bank of japan", "bank of canada",
    "bank of australia", "bank of russia", "bank of china",
    "bank of india", "bank of mexico", "bank of korea",
    "reserve bank",
    "national bank",
    "international bank",
    "african development bank",
    "asian development bank",
    "inter-american development bank",
    "islamic development bank",
    "bank for international",
    "european central bank",
];

const AWARD_GIVERS: &[&str] = &[
    "nobel", "pulitzer", "guggenheim", "sloan", "macarthur", "wolf ",
    "turing", "fields medal", "lasker", "templeton", "ramón cajal",
    "shaw prize", "tang prize",
];

const AWARD_SUFFIXES: &[&str] = &[
    "prize", "award", "fellowship", "medal", "scholarship", "grant",
];

fn matches_any(name_lower: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| name_lower.contains(kw))
}

/// Cascade of (category, keyword table), tried in priority order.
fn keyword_stages() -> &'static [(Category, &'static [&'static str])] {
    static STAGES: OnceLock<Vec<(Category, &'static [&'static str])>> = OnceLock::new();
    STAGES.get_or_init(|| {
        vec![
            (Category::UnSystem, UN_KEYWORDS),
            (Category::Intergovernmental, INTERGOVERNMENTAL_KEYWORDS),
            (Category::NationalGovernment, NATIONAL_GOV_KEYWORDS),
            (Category::University, UNIVERSITY_KEYWORDS),
            (Category::Ngo, NGO_KEYWORDS),
        ]
    })
}

/// Test `raw_name` against the keyword tables in priority order. Private
/// is tested last and separately, since a private-keyword hit can still be
/// vetoed by [`PRIVATE_EXCLUSIONS`].
fn classify_by_keywords(raw_name: &str) -> Option<Category> {
    let name_lower = raw_name.to_lowercase();

    for (category, keywords) in keyword_stages() {
        if matches_any(&name_lower, keywords) {
            return Some(*category);
        }
    }

    if matches_any(&name_lower, PRIVATE_KEYWORDS) && !matches_any(&name_lower, PRIVATE_EXCLUSIONS) {
        return Some(Category::Private);
    }

    None
}

fn is_ordinal_parliament(raw_name: &str) -> bool {
    let lower = raw_name.to_lowercase();
    let Some(digit_start) = lower.find(|c: char| c.is_ascii_digit()) else {
        return false;
    };
    let rest = &lower[digit_start..];
    let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    if digits_end == 0 {
        return false;
    }
    let after_digits = &rest[digits_end..];
    let ordinal_suffixes = ["st ", "nd ", "rd ", "th "];
    let has_ordinal_suffix = ordinal_suffixes.iter().any(|s| after_digits.starts_with(s));
    has_ordinal_suffix
        && (after_digits.contains("parliament")
            || after_digits.contains("national assembly")
            || after_digits.contains("legislative assembly"))
}

fn classify_by_structure(raw_name: &str) -> Option<Category> {
    if is_ordinal_parliament(raw_name) {
        return Some(Category::NationalGovernment);
    }

    let lower = raw_name.to_lowercase();
    let trimmed = lower.trim_end();
    if AWARD_SUFFIXES.iter().any(|s| trimmed.ends_with(s)) {
        return Some(Category::Other);
    }
    if matches_any(&lower, AWARD_GIVERS) {
        return Some(Category::Other);
    }

    None
}

/// Classify a raw organization name string. Always returns a category —
/// `Other` is the default bucket, never an error.
pub fn classify_org(raw_name: &str) -> Category {
    if raw_name.trim().is_empty() {
        return Category::Other;
    }

    classify_by_keywords(raw_name)
        .or_else(|| classify_by_structure(raw_name))
        .unwrap_or(Category::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn un_system_beats_intergovernmental_on_priority() {
        assert!(matches!(
            classify_org("United Nations Development Programme"),
            Category::UnSystem
        ));
    }

    #[test]
    fn world_bank_excluded_from_private_despite_bank_keyword() {
        assert!(matches!(
            classify_org("World Bank Group"),
            Category::Intergovernmental
        ));
    }

    #[test]
    fn university_classified() {
        assert!(matches!(
            classify_org("University of Zurich"),
            Category::University
        ));
    }

    #[test]
    fn commercial_bank_classified_private() {
        assert!(matches!(classify_org("Deutsche Bank AG"), Category::Private));
    }

    #[test]
    fn ordinal_parliament_matches_structural_pattern() {
        assert!(matches!(
            classify_org("22nd Parliament of Turkey"),
            Category::NationalGovernment
        ));
    }

    #[test]
    fn nobel_prize_classified_other() {
        assert!(matches!(classify_org("Nobel Peace Prize"), Category::Other));
    }

    #[test]
    fn empty_name_classified_other() {
        assert!(matches!(classify_org("   "), Category::Other));
    }

    #[test]
    fn ngo_classified() {
        assert!(matches!(
            classify_org("Amnesty International"),
            Category::Ngo
        ));
    }
}
