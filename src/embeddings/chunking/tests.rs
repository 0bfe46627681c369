use super::*;

/// Rebuild a page from its passages by dropping each passage's overlap with
/// the one before it
fn reconstruct(passages: &[Passage]) -> String {
    let mut text = String::new();
    let mut covered = 0;
    for passage in passages {
        let skip = covered - passage.offset;
        text.extend(passage.text.chars().skip(skip));
        covered = passage.end_offset();
    }
    text
}

fn sample_text(len: usize) -> String {
    let words = [
        "alpha", "beta", "gamma", "delta.", "epsilon", "zeta!", "eta", "theta\n\n", "iota",
        "kappa?", "lambda", "mu",
    ];
    let mut text = String::new();
    let mut i = 0;
    while text.chars().count() < len {
        text.push_str(words[i % words.len()]);
        text.push(' ');
        i += 1;
    }
    text.chars().take(len).collect()
}

#[test]
fn default_config() {
    let config = ChunkingConfig::default();
    assert_eq!(config.chunk_size, 1000);
    assert_eq!(config.chunk_overlap, 100);
    assert!(config.validate().is_ok());
}

#[test]
fn invalid_chunk_config() {
    assert_eq!(
        ChunkingConfig::new(100, 100),
        Err(ChunkError::InvalidChunkConfig {
            size: 100,
            overlap: 100
        })
    );
    assert!(ChunkingConfig::new(100, 150).is_err());
    assert!(ChunkingConfig::new(0, 0).is_err());
    assert!(ChunkingConfig::new(100, 99).is_ok());
    assert!(ChunkingConfig::new(1, 0).is_ok());

    let page = Page::new(1, "some text");
    let config = ChunkingConfig {
        chunk_size: 10,
        chunk_overlap: 20,
    };
    assert!(chunk_page(&page, &config).is_err());
    assert!(chunk_pages(&[page], &config).is_err());
}

#[test]
fn two_page_scenario() {
    let long_page = sample_text(1500);
    let short_page = "Delta Epsilon are the fourth and fifth letters now";
    assert_eq!(short_page.chars().count(), 50);

    let pages = vec![Page::new(1, long_page.clone()), Page::new(2, short_page)];
    let passages =
        chunk_pages(&pages, &ChunkingConfig::default()).expect("chunking should succeed");

    let first_page: Vec<_> = passages.iter().filter(|p| p.page_number == 1).collect();
    let second_page: Vec<_> = passages.iter().filter(|p| p.page_number == 2).collect();

    assert_eq!(first_page.len(), 2);
    assert_eq!(second_page.len(), 1);

    // Consecutive passages share exactly 100 characters
    let head = first_page[0];
    let tail = first_page[1];
    assert_eq!(tail.offset, head.end_offset() - 100);
    let head_suffix: String = head.text.chars().skip(head.char_len() - 100).collect();
    let tail_prefix: String = tail.text.chars().take(100).collect();
    assert_eq!(head_suffix, tail_prefix);
    assert_eq!(tail.end_offset(), 1500);

    assert_eq!(second_page[0].text, short_page);
    assert_eq!(second_page[0].offset, 0);

    let indices: Vec<usize> = passages.iter().map(|p| p.chunk_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn short_page_is_single_passage() {
    let page = Page::new(7, "A page that fits comfortably.");
    let passages = chunk_page(&page, &ChunkingConfig::default()).expect("chunking should succeed");

    assert_eq!(passages.len(), 1);
    assert_eq!(passages[0].text, page.text);
    assert_eq!(passages[0].page_number, 7);
    assert_eq!(passages[0].offset, 0);
}

#[test]
fn page_exactly_chunk_size_is_single_passage() {
    let text = sample_text(1000);
    let passages = chunk_page(&Page::new(1, text.clone()), &ChunkingConfig::default())
        .expect("chunking should succeed");
    assert_eq!(passages.len(), 1);
    assert_eq!(passages[0].text, text);
}

#[test]
fn blank_pages_yield_no_passages() {
    let pages = vec![
        Page::new(1, ""),
        Page::new(2, "   \n\n  "),
        Page::new(3, "Only this page has words."),
    ];
    let passages =
        chunk_pages(&pages, &ChunkingConfig::default()).expect("chunking should succeed");

    assert_eq!(passages.len(), 1);
    assert_eq!(passages[0].page_number, 3);
    assert_eq!(passages[0].chunk_index, 0);
}

#[test]
fn round_trip_coverage() {
    let text = sample_text(2345);
    let page = Page::new(1, text.clone());

    for (size, overlap) in [
        (1000, 100),
        (500, 0),
        (300, 299),
        (64, 16),
        (10, 9),
        (1, 0),
        (2, 1),
    ] {
        let config = ChunkingConfig::new(size, overlap).expect("valid config");
        let passages = chunk_page(&page, &config).expect("chunking should succeed");

        assert_eq!(reconstruct(&passages), text, "size={size} overlap={overlap}");
        assert_eq!(passages[0].offset, 0);

        for pair in passages.windows(2) {
            assert_eq!(
                pair[1].offset,
                pair[0].end_offset() - overlap,
                "size={size} overlap={overlap}"
            );
            assert!(pair[1].offset > pair[0].offset);
        }

        for passage in &passages {
            assert!(passage.char_len() <= size);
            let expected: String = text
                .chars()
                .skip(passage.offset)
                .take(passage.char_len())
                .collect();
            assert_eq!(passage.text, expected);
        }
    }
}

#[test]
fn prefers_natural_boundaries() {
    let paragraph_one = "First paragraph sentence one. First paragraph sentence two.";
    let paragraph_two = "Second paragraph keeps going with many more words in it.";
    let text = format!("{paragraph_one}\n\n{paragraph_two}");
    let config = ChunkingConfig::new(80, 10).expect("valid config");

    let passages =
        chunk_page(&Page::new(1, text.clone()), &config).expect("chunking should succeed");

    assert!(passages.len() >= 2);
    assert!(passages[0].text.ends_with("\n\n"));
    assert_eq!(reconstruct(&passages), text);
}

#[test]
fn avoids_cutting_words_when_possible() {
    let text = "word ".repeat(100);
    let config = ChunkingConfig::new(42, 5).expect("valid config");

    let passages =
        chunk_page(&Page::new(1, text.clone()), &config).expect("chunking should succeed");

    for passage in &passages[..passages.len() - 1] {
        assert!(passage.text.ends_with(' '), "{:?}", passage.text);
    }
    assert_eq!(reconstruct(&passages), text);
}

#[test]
fn hard_cut_without_boundaries() {
    let text = "x".repeat(250);
    let config = ChunkingConfig::new(100, 20).expect("valid config");

    let passages =
        chunk_page(&Page::new(1, text.clone()), &config).expect("chunking should succeed");

    let spans: Vec<(usize, usize)> = passages
        .iter()
        .map(|p| (p.offset, p.end_offset()))
        .collect();
    assert_eq!(spans, vec![(0, 100), (80, 180), (160, 250)]);
    assert_eq!(reconstruct(&passages), text);
}

#[test]
fn multibyte_text_is_split_on_characters() {
    let text = "日本語のテキスト。".repeat(40);
    let config = ChunkingConfig::new(50, 10).expect("valid config");

    let passages =
        chunk_page(&Page::new(1, text.clone()), &config).expect("chunking should succeed");

    assert!(passages.len() > 1);
    for passage in &passages {
        assert!(passage.char_len() <= 50);
    }
    assert_eq!(reconstruct(&passages), text);
}
