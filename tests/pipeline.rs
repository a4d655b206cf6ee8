//! End-to-end ranking over real extraction with deterministic oracles.
//!
//! Similarity is a bag-of-words cosine so results are predictable without a
//! model download or network access.

use std::collections::HashSet;
use std::sync::Mutex;

use anyhow::{bail, Result};
use shortlist::extract::MIME_PDF;
use shortlist::progress::{ProgressEvent, ProgressReporter};
use shortlist::request::{parse_request, RequestDocument};
use shortlist::run::{build_resolver, extract_documents, Pipeline};
use shortlist_core::embedding::SimilarityOracle;
use shortlist_core::label::Summarizer;
use shortlist_core::store::{PassageStore, RawPassage};
use shortlist_core::taxonomy::TaxonomyResolver;
use tempfile::TempDir;

const TIMESTAMP: &str = "2026-10-19T09:30:00.000000";

fn words(s: &str) -> HashSet<String> {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Binary bag-of-words cosine.
struct OverlapOracle;

impl SimilarityOracle for OverlapOracle {
    fn compare(&self, a: &str, b: &str) -> Result<f32> {
        let (wa, wb) = (words(a), words(b));
        if wa.is_empty() || wb.is_empty() {
            return Ok(0.0);
        }
        let shared = wa.intersection(&wb).count() as f32;
        Ok(shared / ((wa.len() * wb.len()) as f32).sqrt())
    }

    fn compare_batch(&self, query: &str, texts: &[&str]) -> Result<Vec<f32>> {
        texts.iter().map(|t| self.compare(query, t)).collect()
    }
}

struct OfflineOracle;

impl SimilarityOracle for OfflineOracle {
    fn compare(&self, _a: &str, _b: &str) -> Result<f32> {
        bail!("embedding service unavailable")
    }

    fn compare_batch(&self, _query: &str, _texts: &[&str]) -> Result<Vec<f32>> {
        bail!("embedding service unavailable")
    }
}

/// First three words, as a title.
struct FirstWords;

impl Summarizer for FirstWords {
    fn name(&self) -> &str {
        "first-words"
    }

    fn summarize(&self, text: &str, _max_chars: usize) -> Result<String> {
        Ok(text.split_whitespace().take(3).collect::<Vec<_>>().join(" "))
    }
}

#[derive(Default)]
struct Recorder(Mutex<Vec<ProgressEvent>>);

impl ProgressReporter for Recorder {
    fn report(&self, event: ProgressEvent) {
        self.0.lock().unwrap().push(event);
    }
}

impl Recorder {
    fn taxonomy(&self) -> Option<String> {
        self.0.lock().unwrap().iter().find_map(|e| match e {
            ProgressEvent::Ranking { taxonomy, .. } => Some(taxonomy.clone()),
            _ => None,
        })
    }
}

fn request(challenge_id: &str, role: &str, task: &str, files: &[&str]) -> RequestDocument {
    let json = serde_json::json!({
        "challenge_info": { "challenge_id": challenge_id },
        "documents": files.iter().map(|f| serde_json::json!({ "filename": f })).collect::<Vec<_>>(),
        "persona": { "role": role },
        "job_to_be_done": { "task": task }
    });
    parse_request(&json.to_string()).unwrap()
}

fn store(passages: &[(&str, u32, &str)]) -> PassageStore {
    let mut store = PassageStore::new();
    for (source, position, text) in passages {
        store.add_document(
            source,
            [RawPassage {
                position: *position,
                text: text.to_string(),
            }],
        );
    }
    store
}

fn rank(
    resolver: &TaxonomyResolver,
    oracle: &dyn SimilarityOracle,
    request: &RequestDocument,
    store: &mut PassageStore,
    progress: &Recorder,
) -> Result<serde_json::Value> {
    let pipeline = Pipeline {
        resolver,
        oracle,
        summarizer: &FirstWords,
        label_chars: 80,
        progress,
        clock: &|| TIMESTAMP.to_string(),
    };
    let doc = pipeline.rank(request, store)?;
    Ok(serde_json::to_value(doc)?)
}

const CITIES: &str = "Nice and Marseille are major cities in the South of France with travel guides for the region.";
const BEACHES: &str = "Beach trips along the Mediterranean Sea offer water sports and coastal adventures for groups.";
const FOOD: &str = "Wine tours and cooking classes give a taste of culinary experiences and local food.";
const PACKING: &str = "Packing tips: bring travel essentials such as sunscreen, adapters, and light layers.";

fn travel_store() -> PassageStore {
    store(&[
        ("Cities.pdf", 1, CITIES),
        ("Cities.pdf", 2, BEACHES),
        ("Cuisine.pdf", 3, FOOD),
        ("Cuisine.pdf", 4, BEACHES),
        ("Tips.pdf", 1, PACKING),
    ])
}

#[test]
fn travel_request_selects_one_unique_passage_per_category() {
    let req = request(
        "round_1b_002",
        "Travel Planner",
        "Plan a trip of 4 days for a group of 10 college friends.",
        &["Cities.pdf", "Cuisine.pdf", "Tips.pdf"],
    );
    let mut store = travel_store();
    let progress = Recorder::default();
    let out = rank(&TaxonomyResolver::builtin(), &OverlapOracle, &req, &mut store, &progress)
        .unwrap();

    assert_eq!(progress.taxonomy().as_deref(), Some("travel_planning"));

    let sections = out["extracted_sections"].as_array().unwrap();
    let analysis = out["subsection_analysis"].as_array().unwrap();
    // Five categories, four distinct texts.
    assert_eq!(sections.len(), 4);
    assert_eq!(analysis.len(), 4);

    for (i, section) in sections.iter().enumerate() {
        assert_eq!(section["importance_rank"], i as u64 + 1);
    }
    let texts: HashSet<&str> = analysis
        .iter()
        .map(|a| a["refined_text"].as_str().unwrap())
        .collect();
    assert_eq!(texts.len(), 4, "selection contains duplicate text");

    assert_eq!(analysis[0]["refined_text"], CITIES);
    assert_eq!(analysis[1]["refined_text"], BEACHES);
    // The first copy of a duplicated passage is the one kept.
    assert_eq!(analysis[1]["document"], "Cities.pdf");
    assert_eq!(analysis[1]["page_number"], 2);
    assert_eq!(sections[0]["section_title"], "Nice and Marseille");
    assert_eq!(out["metadata"]["processing_timestamp"], TIMESTAMP);
    assert_eq!(out["metadata"]["persona"], "Travel Planner");
}

#[test]
fn ranking_is_deterministic() {
    let req = request("", "Travel Planner", "Plan a trip", &["Cities.pdf"]);
    let resolver = TaxonomyResolver::builtin();
    let first = rank(&resolver, &OverlapOracle, &req, &mut travel_store(), &Recorder::default())
        .unwrap();
    let second = rank(&resolver, &OverlapOracle, &req, &mut travel_store(), &Recorder::default())
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn dinner_sources_beat_lunch_sources_on_equal_scores() {
    let lunch = "Vegetarian lasagna with spinach and ricotta makes a hearty main course alpha.";
    let dinner = "Vegetarian lasagna with spinach and ricotta makes a hearty main course omega.";
    let req = request(
        "round_1b_001",
        "Food Contractor",
        "Prepare a vegetarian buffet-style dinner menu for a corporate gathering",
        &["Lunch Ideas.pdf", "Dinner Ideas - Mains.pdf"],
    );
    let mut store = store(&[
        ("Lunch Ideas.pdf", 1, lunch),
        ("Dinner Ideas - Mains.pdf", 5, dinner),
    ]);
    let progress = Recorder::default();
    let out = rank(&TaxonomyResolver::builtin(), &OverlapOracle, &req, &mut store, &progress)
        .unwrap();

    assert_eq!(progress.taxonomy().as_deref(), Some("dinner_menu"));
    let sections = out["extracted_sections"].as_array().unwrap();
    // Four categories, two passages: later categories starve.
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0]["document"], "Dinner Ideas - Mains.pdf");
    assert_eq!(sections[0]["page_number"], 5);
    assert_eq!(sections[1]["document"], "Lunch Ideas.pdf");
}

#[test]
fn override_id_beats_keywords() {
    let req = request(
        "round_1b_003",
        "PhD Researcher",
        "literature review of drug discovery",
        &[],
    );
    let progress = Recorder::default();
    let out = rank(
        &TaxonomyResolver::builtin(),
        &OverlapOracle,
        &req,
        &mut PassageStore::new(),
        &progress,
    )
    .unwrap();
    assert_eq!(progress.taxonomy().as_deref(), Some("form_management"));
    assert!(out["extracted_sections"].as_array().unwrap().is_empty());
}

#[test]
fn custom_taxonomy_from_config_is_used() {
    let cfg: shortlist::config::Config = toml::from_str(
        r#"
[[taxonomies]]
name = "itinerary"
keywords = ["college friends"]
categories = [
  { key = "food", description = "food wine cooking" },
  { key = "sea", description = "beach sea coastal" },
]
"#,
    )
    .unwrap();
    let req = request("", "Travel Planner", "Trip for college friends", &[]);
    let progress = Recorder::default();
    let out = rank(
        &build_resolver(&cfg.taxonomies),
        &OverlapOracle,
        &req,
        &mut travel_store(),
        &progress,
    )
    .unwrap();
    assert_eq!(progress.taxonomy().as_deref(), Some("itinerary"));
    let analysis = out["subsection_analysis"].as_array().unwrap();
    assert_eq!(analysis[0]["refined_text"], FOOD);
    assert_eq!(analysis[1]["refined_text"], BEACHES);
}

#[test]
fn oracle_failure_aborts_the_request() {
    let req = request("", "Travel Planner", "Plan a trip", &["Cities.pdf"]);
    let err = rank(
        &TaxonomyResolver::builtin(),
        &OfflineOracle,
        &req,
        &mut travel_store(),
        &Recorder::default(),
    )
    .unwrap_err();
    assert!(format!("{:#}", err).contains("embedding service unavailable"));
}

fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 10.into()]),
                Operation::new("Td", vec![40.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

fn docx_with_paragraph(text: &str) -> Vec<u8> {
    use std::io::Write;
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        let xml = format!(
            "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:body></w:document>",
            text
        );
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}

#[tokio::test]
async fn extraction_keeps_request_order_and_skips_missing_documents() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("Guide.pdf"),
        pdf_with_pages(&[
            "Roasted vegetable lasagna is a crowd pleaser for any dinner buffet.",
            "Short",
            "Ratatouille pairs well with crusty bread and a simple green salad.",
        ]),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("Notes.docx"),
        docx_with_paragraph("Gluten-free falafel wraps can be prepared the day before serving."),
    )
    .unwrap();
    std::fs::write(dir.path().join("Broken.pdf"), b"not really a pdf").unwrap();

    let req = request(
        "",
        "Food Contractor",
        "Dinner menu",
        &["Notes.docx", "Missing.pdf", "Guide.pdf", "Broken.pdf"],
    );
    let progress = Recorder::default();
    let store = extract_documents(&req, dir.path(), 50, &progress).await;

    let sources: Vec<(&str, u32)> = store
        .passages()
        .iter()
        .map(|p| (p.source_id.as_str(), p.position))
        .collect();
    assert_eq!(
        sources,
        vec![("Notes.docx", 1), ("Guide.pdf", 1), ("Guide.pdf", 3)]
    );
    assert!(store.passages()[1].text.contains("vegetable lasagna"));

    let events = progress.0.lock().unwrap();
    let skipped: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Skipped { document, .. } => Some(document.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(skipped, vec!["Missing.pdf", "Broken.pdf"]);
    let parsed = events
        .iter()
        .filter(|e| matches!(e, ProgressEvent::Parsing { .. }))
        .count();
    assert_eq!(parsed, 4);
}

#[test]
fn pdf_pages_become_positions() {
    let bytes = pdf_with_pages(&[
        "Bouillabaisse is the signature fish stew of Marseille and the old port.",
        "Socca is a thin chickpea pancake sold hot at the markets of Nice.",
    ]);
    let passages = shortlist::extract::extract_passages(&bytes, MIME_PDF, 50).unwrap();
    let positions: Vec<u32> = passages.iter().map(|p| p.position).collect();
    assert_eq!(positions, vec![1, 2]);
    assert!(passages[1].text.contains("chickpea pancake"));
}
