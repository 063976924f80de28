use govnav_core::{BuildOptions, Error, IdfScheme, IndexBuilder, RawDocument, SearchIndex};
use std::sync::Arc;

fn doc(title: &str, text: &str) -> RawDocument {
    RawDocument {
        chapter: "Chapter 28 - Zoning Code".into(),
        section: String::new(),
        title: title.into(),
        text: text.into(),
        url: Some(format!("https://library.example.org/{}", title.to_lowercase().replace(' ', "-"))),
    }
}

fn three_docs() -> SearchIndex {
    IndexBuilder::default().build(vec![
        doc("", "fence height front yard setback"),
        doc("", "noise ordinance quiet hours"),
        doc("", "food truck vendor permit"),
    ])
}

fn ordinances() -> Vec<RawDocument> {
    vec![
        doc("Fence Height Limits", "No fence in a required front yard shall exceed four feet in height."),
        doc("Quiet Hours", "Amplified sound is prohibited between ten at night and seven in the morning."),
        doc("Mobile Food Vendors", "A street vending license is required to sell food from a truck."),
        doc("Short-Term Rentals", "Hosts must register each rental unit and renew the registration annually."),
        doc("§", "$ -- 5 -- $"),
    ]
}

#[test]
fn fence_setback_ranks_fence_document_first() {
    let index = three_docs();
    let results = index.search("fence setback", 3).unwrap();
    assert_eq!(results[0].summary.id, 0);
    assert!(results[0].score > 0.0);
    assert!(results[1..].iter().all(|r| r.score < results[0].score));
}

#[test]
fn absent_term_returns_nothing() {
    assert!(three_docs().search("spaceship", 5).unwrap().is_empty());
}

#[test]
fn unknown_terms_are_ignored() {
    let index = three_docs();
    let plain = index.search("fence", 3).unwrap();
    let mixed = index.search("fence spaceship", 3).unwrap();
    assert_eq!(plain.len(), mixed.len());
    assert!((plain[0].score - mixed[0].score).abs() < 1e-6);
}

#[test]
fn empty_query_is_not_an_error() {
    let index = three_docs();
    assert!(index.search("", 3).unwrap().is_empty());
    assert!(index.search("?! ... the and of", 3).unwrap().is_empty());
}

#[test]
fn top_k_bounds() {
    let index = three_docs();
    assert!(matches!(index.search("fence", 0), Err(Error::InvalidArgument(_))));
    let all = index.search("fence noise truck", 50).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(index.search("fence noise truck", 2).unwrap().len(), 2);
}

#[test]
fn ties_break_by_document_id() {
    let index = IndexBuilder::default().build(vec![
        doc("", "parking meter"),
        doc("", "parking meter"),
        doc("", "snow removal"),
    ]);
    let first = index.search("parking", 3).unwrap();
    assert_eq!(first.iter().map(|r| r.summary.id).collect::<Vec<_>>(), vec![0, 1]);
    for _ in 0..5 {
        let again = index.search("parking", 3).unwrap();
        assert_eq!(again.iter().map(|r| r.summary.id).collect::<Vec<_>>(), vec![0, 1]);
    }
}

#[test]
fn exact_title_ranks_first() {
    let index = IndexBuilder::default().build(ordinances());
    for (id, d) in ordinances().iter().enumerate().take(4) {
        let results = index.search(&d.title, 3).unwrap();
        assert_eq!(results[0].summary.id as usize, id, "title {:?}", d.title);
    }
}

#[test]
fn title_terms_outweigh_body_terms() {
    let docs = vec![
        doc("Parking", "meters downtown zone"),
        doc("Meters", "parking downtown zone"),
        doc("Snow", "removal sidewalks winter"),
    ];
    let weighted = IndexBuilder::default().build(docs.clone());
    let results = weighted.search("parking", 3).unwrap();
    assert_eq!(results[0].summary.id, 0);
    assert!(results[0].score > results[1].score);

    let flat = IndexBuilder::new(BuildOptions { title_weight: 1, ..Default::default() }).build(docs);
    let results = flat.search("parking", 3).unwrap();
    assert!((results[0].score - results[1].score).abs() < 1e-6);
}

#[test]
fn document_vectors_are_unit_length() {
    for idf in [IdfScheme::Plain, IdfScheme::Smoothed] {
        let index = IndexBuilder::new(BuildOptions { idf, ..Default::default() }).build(ordinances());
        for d in index.corpus().all() {
            let vector = index.document_vector(d.id).unwrap();
            if vector.is_empty() {
                continue;
            }
            let norm: f32 = vector.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5, "doc {} norm {norm}", d.id);
        }
    }
}

#[test]
fn document_frequencies_within_bounds() {
    let index = IndexBuilder::default().build(ordinances());
    let n = index.num_docs() as u32;
    for term in index.terms() {
        let df = index.df(term).unwrap();
        assert!((1..=n).contains(&df), "{term}: df {df}");
        assert!(index.idf(term).unwrap() >= 0.0);
        assert!(index.postings(term).unwrap().iter().all(|p| p.count >= 1));
    }
}

#[test]
fn rebuilding_is_idempotent() {
    let a = IndexBuilder::default().build(ordinances());
    let b = IndexBuilder::default().build(ordinances());
    assert_eq!(a.terms(), b.terms());
    for term in a.terms() {
        assert_eq!(a.df(term), b.df(term));
        assert_eq!(a.postings(term), b.postings(term));
    }
}

#[test]
fn termless_document_is_retrievable_but_never_matches() {
    let index = IndexBuilder::default().build(ordinances());
    assert_eq!(index.num_docs(), 5);
    assert_eq!(index.get_details(4).unwrap().text, "$ -- 5 -- $");
    assert!(index.document_vector(4).unwrap().is_empty());
    for q in ["5", "fence", "quiet hours", "rental"] {
        assert!(index.search(q, 5).unwrap().iter().all(|r| r.summary.id != 4));
    }
}

#[test]
fn empty_corpus_is_searchable() {
    let index = IndexBuilder::default().build(Vec::new());
    assert!(index.is_empty());
    assert!(index.search("fence", 10).unwrap().is_empty());
    assert!(matches!(index.get_details(0), Err(Error::NotFound(_))));
}

#[test]
fn details_return_original_fields() {
    let index = three_docs();
    let d = index.get_details(1).unwrap();
    assert_eq!(d.text, "noise ordinance quiet hours");
    assert_eq!(d.url, "https://library.example.org/");
    assert!(matches!(index.get_details(3), Err(Error::NotFound(_))));
}

#[test]
fn results_carry_citations_and_snippets() {
    let index = IndexBuilder::default().build(ordinances());
    let r = &index.search("vending license", 1).unwrap()[0];
    assert_eq!(r.summary.title, "Mobile Food Vendors");
    assert_eq!(r.summary.chapter, "Chapter 28 - Zoning Code");
    assert_eq!(r.summary.url, "https://library.example.org/mobile-food-vendors");
    assert!(r.snippet.contains("vending license"));
}

#[test]
fn concurrent_queries_share_one_index() {
    let index = Arc::new(IndexBuilder::default().build(ordinances()));
    let expected = index.search("fence height", 3).unwrap();
    std::thread::scope(|s| {
        for _ in 0..4 {
            let index = Arc::clone(&index);
            let expected = &expected;
            s.spawn(move || {
                let got = index.search("fence height", 3).unwrap();
                assert_eq!(got.len(), expected.len());
                for (g, e) in got.iter().zip(expected.iter()) {
                    assert_eq!(g.summary, e.summary);
                    assert_eq!(g.score, e.score);
                }
            });
        }
    });
}
