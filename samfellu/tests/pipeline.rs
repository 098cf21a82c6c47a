use samfellu::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use tempfile::TempDir;

fn memory_config() -> SamfelluConfig {
    SamfelluConfig {
        spill: SpillStorage::Memory,
        ..SamfelluConfig::default()
    }
}

fn three_classes() -> Vec<Direction> {
    vec![
        Direction::new("nouns", &["NOUN"]),
        Direction::new("verbs", &["VERB"]),
        Direction::new("adverbs", &["ADVB"]),
    ]
}

fn close(a: Point, b: Point) -> bool {
    (a.0 - b.0).abs() < 1e-6 && (a.1 - b.1).abs() < 1e-6
}

// Geometry checks tag with the fixed suffix rules, independent of dictionary data.
fn suffix_tagged(text: &str, config: SamfelluConfig) -> Samfellu {
    Samfellu::new(TextSource::from(text), config, Box::new(SuffixAnalyzer::new())).unwrap()
}

fn recorded(text: &str, config: SamfelluConfig) -> (Samfellu, RecordingSurface) {
    let mut samfellu = suffix_tagged(text, config);
    samfellu.parse_words().unwrap();
    samfellu.construct_line().unwrap();
    let mut surface = RecordingSurface::new(640, 640);
    samfellu.draw_on(&mut surface).unwrap();
    (samfellu, surface)
}

#[test]
fn test_three_unit_steps_close_the_triangle() {
    let config = SamfelluConfig {
        custom_directions: Some(three_classes()),
        normalization: Normalization::None,
        ..memory_config()
    };
    let (samfellu, surface) = recorded("кот бежит быстро", config);
    assert_eq!(samfellu.total_words(), 3);
    assert_eq!(samfellu.counter().unwrap().as_slice(), &[1, 1, 1]);

    let segments = surface.segments();
    assert_eq!(segments.len(), 3);
    // Unit vectors at 0, 120 and 240 degrees sum to zero: back to the start.
    assert!(close(segments[2].to, segments[0].from));
    for pair in segments.windows(2) {
        assert_eq!(pair[0].to, pair[1].from);
    }
    let bbox = samfellu.bounding_box().unwrap();
    assert!((bbox.x1 - 1.0).abs() < 1e-9);
    assert!((bbox.y1 - 3f64.sqrt() / 2.0).abs() < 1e-9);
}

#[test]
fn test_runs_are_deterministic() {
    let text = "Мороз и солнце; день чудесный! Еще ты дремлешь, друг прелестный.";
    let (_, first) = recorded(text, memory_config());
    let (_, second) = recorded(text, SamfelluConfig::default());
    assert!(!first.calls().is_empty());
    assert_eq!(first.calls(), second.calls());
}

#[test]
fn test_general_and_none_step_lengths() {
    let text = "кот кот кот бежит";
    let (general, _) = recorded(text, memory_config());
    let normals = general.normals().unwrap();
    assert!((normals[0] - 1.0 / 3.0).abs() < 1e-12);
    assert_eq!(normals[1], 1.0);
    assert_eq!(&normals[2..], &[0.0, 0.0]);
    let bbox = general.bounding_box().unwrap();
    assert!((bbox.width() - 1.0).abs() < 1e-9);
    assert!((bbox.height() - 1.0).abs() < 1e-9);

    let (none, _) = recorded(
        text,
        SamfelluConfig {
            normalization: Normalization::None,
            ..memory_config()
        },
    );
    let bbox = none.bounding_box().unwrap();
    assert!((bbox.width() - 3.0).abs() < 1e-9);
    assert!((bbox.height() - 1.0).abs() < 1e-9);
}

#[test]
fn test_drawn_points_stay_inside_the_padded_frame() {
    let text = "Старый дуб стоял у дороги. Он был в два раза толще берез и выше их. \
                Огромные корявые руки торчали из него, и он стоял старым уродом.";
    let padding = 0.1;
    let (_, surface) = recorded(
        text,
        SamfelluConfig {
            padding,
            directions: DirectionChoice::Six,
            ..memory_config()
        },
    );
    let (lo, hi) = (640.0 * padding - 1e-6, 640.0 * (1.0 - padding) + 1e-6);
    for s in surface.segments() {
        for (x, y) in [s.from, s.to] {
            assert!(x >= lo && x <= hi && y >= lo && y <= hi, "({x}, {y}) outside");
        }
    }
}

#[test]
fn test_from_center_box_is_symmetric() {
    let (samfellu, surface) = recorded(
        "кот кот бежит",
        SamfelluConfig {
            from_center: true,
            ..memory_config()
        },
    );
    let bbox = samfellu.bounding_box().unwrap();
    assert_eq!(bbox.x0, -bbox.x1);
    assert_eq!(bbox.y0, -bbox.y1);
    assert!(close(surface.segments()[0].from, (320.0, 320.0)));
}

#[test]
fn test_short_manual_normals_fail_before_reading() {
    let config = SamfelluConfig {
        normalization: Normalization::Manual(vec![1.0, 1.0]),
        ..memory_config()
    };
    // The file does not exist, a configuration error proves nothing was opened.
    let err = Samfellu::with_default_analyzer(
        TextSource::File("/nonexistent/samfellu/input.txt".into()),
        config,
    )
    .err()
    .unwrap();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_stages_out_of_order() {
    let mut samfellu =
        Samfellu::with_default_analyzer(TextSource::from("кот бежит"), memory_config()).unwrap();
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("early.png");

    assert_eq!(samfellu.construct_line().unwrap_err().kind(), ErrorKind::Sequence);
    assert_eq!(samfellu.draw().unwrap_err().kind(), ErrorKind::Sequence);
    assert_eq!(samfellu.draw_legend().unwrap_err().kind(), ErrorKind::Sequence);
    assert_eq!(samfellu.write_output(&out).unwrap_err().kind(), ErrorKind::Sequence);

    samfellu.parse_words().unwrap();
    assert_eq!(samfellu.parse_words().unwrap_err().kind(), ErrorKind::Sequence);
    assert_eq!(samfellu.draw().unwrap_err().kind(), ErrorKind::Sequence);

    samfellu.construct_line().unwrap();
    assert_eq!(samfellu.construct_line().unwrap_err().kind(), ErrorKind::Sequence);
    assert_eq!(samfellu.write_output(&out).unwrap_err().kind(), ErrorKind::Sequence);
    assert!(!out.exists());
}

#[test]
fn test_process_writes_png() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.txt");
    std::fs::write(&input, "Кот бежит быстро. Собака лает громко, а птицы поют.").unwrap();
    let output = dir.path().join("out.png");

    let config = SamfelluConfig {
        image_size: "320x200".parse().unwrap(),
        line_width: 2.0,
        spill_dir: Some(dir.path().to_path_buf()),
        ..SamfelluConfig::default()
    };
    let mut samfellu = Samfellu::with_default_analyzer(TextSource::File(input), config).unwrap();
    samfellu.process().unwrap();
    samfellu.write_output(&output).unwrap();

    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    let entries = samfellu.legend_entries().unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(
        entries.iter().map(|(_, c)| c).sum::<u64>(),
        samfellu.total_words()
    );
}

#[test]
fn test_empty_text_draws_nothing() {
    let dir = TempDir::new().unwrap();
    let mut samfellu =
        Samfellu::with_default_analyzer(TextSource::from("... 42 !"), memory_config()).unwrap();
    samfellu.process().unwrap();
    assert_eq!(samfellu.total_words(), 0);
    assert!(samfellu.bounding_box().unwrap().is_degenerate());
    assert!(samfellu.normals().unwrap().iter().all(|n| *n == 0.0));
    samfellu.write_output(&dir.path().join("empty.png")).unwrap();
}

#[derive(Default)]
struct Progress {
    words: Vec<u64>,
    line: Vec<(u64, u64)>,
    drawn: Vec<(u64, u64)>,
    stages: Vec<Stage>,
}

struct SharedMonitor(Rc<RefCell<Progress>>);

impl ProgressMonitor for SharedMonitor {
    fn stage_started(&mut self, stage: Stage) {
        self.0.borrow_mut().stages.push(stage);
    }
    fn words(&mut self, classified: u64) {
        self.0.borrow_mut().words.push(classified);
    }
    fn line_points(&mut self, done: u64, total: u64) {
        self.0.borrow_mut().line.push((done, total));
    }
    fn drawn_points(&mut self, done: u64, total: u64) {
        self.0.borrow_mut().drawn.push((done, total));
    }
}

#[test]
fn test_progress_counts_classified_words_only() {
    let progress = Rc::new(RefCell::new(Progress::default()));
    let mut samfellu = suffix_tagged("кот 2024 hello бежит быстро", memory_config())
        .with_monitor(Box::new(SharedMonitor(progress.clone())));
    samfellu.process().unwrap();

    let progress = progress.borrow();
    assert_eq!(progress.stages, vec![Stage::Parse, Stage::Construct, Stage::Draw]);
    assert_eq!(progress.words.last(), Some(&3));
    assert_eq!(progress.line.last(), Some(&(3, 3)));
    assert_eq!(progress.drawn, vec![(1, 3), (2, 3), (3, 3)]);
}

#[test]
fn test_custom_analyzer_is_used() {
    let analyzer = DictionaryAnalyzer::from_entries(
        [("стали", "VERB,perf"), ("стали", "NOUN,femn")],
        Box::new(SuffixAnalyzer::new()),
    );
    let config = SamfelluConfig {
        directions: DirectionChoice::ThreeLess,
        ..memory_config()
    };
    let mut samfellu =
        Samfellu::new(TextSource::from("стали стали"), config, Box::new(analyzer)).unwrap();
    samfellu.parse_words().unwrap();
    assert_eq!(samfellu.counter().unwrap().as_slice(), &[0, 2, 0]);
}

#[test]
fn test_legend_is_drawn_once() {
    let mut samfellu = suffix_tagged("кот бежит быстро", memory_config());
    samfellu.process().unwrap();
    assert_eq!(samfellu.draw_legend().unwrap_err().kind(), ErrorKind::Sequence);

    let mut samfellu = suffix_tagged(
        "кот бежит быстро",
        SamfelluConfig {
            draw_legend: false,
            ..memory_config()
        },
    );
    samfellu.process().unwrap();
    samfellu.draw_legend().unwrap();
    assert_eq!(samfellu.draw_legend().unwrap_err().kind(), ErrorKind::Sequence);
}

#[cfg(feature = "opencorpora")]
#[test]
fn test_default_analyzer_reads_common_verbs() {
    let config = SamfelluConfig {
        custom_directions: Some(vec![
            Direction::new("nouns", &["NOUN"]),
            Direction::new("verbs", &["VERB"]),
        ]),
        ..memory_config()
    };
    let mut samfellu =
        Samfellu::with_default_analyzer(TextSource::from("Ночь. Я был там, хочу домой."), config)
            .unwrap();
    samfellu.parse_words().unwrap();
    assert_eq!(samfellu.counter().unwrap().as_slice(), &[1, 2]);
}
