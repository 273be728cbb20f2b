//! End-to-end runs of the routine engine.

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use proptest::prelude::*;
use qc_engine::{
    CancellationToken, ConfiguredRoutine, EngineError, ProgressSink, RoutineOutcome,
    RoutineRunner, RoutineSpec, RoutineStatus, RunReport, RunState, build_routines,
};
use qc_model::{
    ColumnConfig, ColumnSpec, ColumnType, Dataset, DatasetView, FieldValue, Flag, Message,
    MessageId,
};
use qc_routine::{Parameters, Routine, RoutineError, RoutineRegistry};

fn dataset(records: usize) -> Dataset {
    let columns = ColumnConfig::new(vec![
        ColumnSpec::new("Col0", ColumnType::Numeric),
        ColumnSpec::new("Col1", ColumnType::Numeric),
        ColumnSpec::new("Col2", ColumnType::Numeric),
    ])
    .unwrap();
    let rows = (1..=records)
        .map(|i| {
            vec![
                FieldValue::Number(i as f64),
                FieldValue::Number(i as f64 * 10.0),
                FieldValue::Missing,
            ]
        })
        .collect();
    Dataset::from_rows(columns, rows).unwrap()
}

fn initialised(name: &str, routine: Box<dyn Routine>, parameters: &[&str]) -> ConfiguredRoutine {
    let parameters = parameters.iter().map(|p| p.to_string()).collect();
    let mut configured = ConfiguredRoutine::new(name, routine, parameters);
    configured.initialise().unwrap();
    configured
}

/// Always fails, after attaching a message.
struct AlwaysFails;

impl Routine for AlwaysFails {
    fn initialise(&mut self, _parameters: &[String]) -> qc_routine::Result<()> {
        Ok(())
    }

    fn process_records(&mut self, dataset: &mut DatasetView<'_>) -> qc_routine::Result<()> {
        dataset.add_message(Message::new(0, "Col0", Flag::Fatal, 1, "1")?)?;
        let error = "not-a-number".parse::<f64>().unwrap_err();
        Err(RoutineError::processing_with("cannot read sensor value", error))
    }
}

/// Flags every record on one column with one flag. Parameters: `[column, flag]`.
#[derive(Default)]
struct FlagEvery {
    config: Option<(String, Flag)>,
    calls: Arc<AtomicUsize>,
}

impl Routine for FlagEvery {
    fn initialise(&mut self, parameters: &[String]) -> qc_routine::Result<()> {
        let params = Parameters::exact(parameters, 2)?;
        self.config = Some((params.text(0)?.to_string(), params.flag(1)?));
        Ok(())
    }

    fn process_records(&mut self, dataset: &mut DatasetView<'_>) -> qc_routine::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let (column, flag) = self.config.clone().ok_or(RoutineError::NotInitialised)?;
        let index = dataset.columns().index_of(&column)?;
        let mut messages = Vec::new();
        for record in dataset.records() {
            let value = record.get_value(index)?.to_string();
            messages.push(Message::new(index, column.as_str(), flag, record.line(), value)?);
        }
        for message in messages {
            dataset.add_message(message)?;
        }
        Ok(())
    }
}

/// Test fixture with three overlapping passes over line ranges:
///
/// 1. lines 1-5: QUESTIONABLE on Col1
/// 2. lines 6-10: BAD on Col2
/// 3. lines 1-15: QUESTIONABLE on Col1 and BAD on Col2
struct OverlappingRanges;

impl OverlappingRanges {
    fn flag_range(
        dataset: &mut DatasetView<'_>,
        lines: RangeInclusive<usize>,
        column: &str,
        flag: Flag,
    ) -> qc_routine::Result<()> {
        let index = dataset.columns().index_of(column)?;
        let mut messages = Vec::new();
        for record in dataset.records().iter().filter(|r| lines.contains(&r.line())) {
            let value = record.get_value(index)?.to_string();
            messages.push(Message::new(index, column, flag, record.line(), value)?);
        }
        for message in messages {
            dataset.add_message(message)?;
        }
        Ok(())
    }
}

impl Routine for OverlappingRanges {
    fn initialise(&mut self, parameters: &[String]) -> qc_routine::Result<()> {
        Parameters::exact(parameters, 0).map(|_| ())
    }

    fn process_records(&mut self, dataset: &mut DatasetView<'_>) -> qc_routine::Result<()> {
        Self::flag_range(dataset, 1..=5, "Col1", Flag::Questionable)?;
        Self::flag_range(dataset, 6..=10, "Col2", Flag::Bad)?;
        Self::flag_range(dataset, 1..=15, "Col1", Flag::Questionable)?;
        Self::flag_range(dataset, 1..=15, "Col2", Flag::Bad)?;
        Ok(())
    }
}

#[test]
fn failing_routine_does_not_stop_later_routines() {
    let runner = RoutineRunner::new(vec![
        initialised("A", Box::new(AlwaysFails), &[]),
        initialised("B", Box::<FlagEvery>::default(), &["Col1", "questionable"]),
    ]);
    let result = runner.run(dataset(3)).unwrap();

    assert_eq!(result.state, RunState::PartiallyFailed);
    assert_eq!(result.failed_routines().collect::<Vec<_>>(), vec!["A"]);
    let failure = &result.failures[0];
    assert_eq!(failure.position, 0);
    assert!(std::error::Error::source(&failure.error).is_some());

    for record in result.dataset.records() {
        assert_eq!(record.qc_flag(), Flag::Questionable);
        assert_eq!(record.messages().len(), 1);
        assert_eq!(record.messages()[0].column_index(), 1);
    }
    assert_eq!(result.outcomes[0].status, RoutineStatus::Failed);
    assert_eq!(result.outcomes[1].status, RoutineStatus::Completed);
    assert_eq!(result.outcomes[1].messages_added, 3);
}

#[test]
fn uninitialised_routine_is_rejected_before_processing() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut rejected = ConfiguredRoutine::new(
        "rejected",
        Box::new(FlagEvery {
            config: None,
            calls: Arc::clone(&calls),
        }),
        vec!["Col1".to_string()],
    );
    assert!(rejected.initialise().is_err());

    let good_calls = Arc::new(AtomicUsize::new(0));
    let good = initialised(
        "good",
        Box::new(FlagEvery {
            config: None,
            calls: Arc::clone(&good_calls),
        }),
        &["Col1", "bad"],
    );

    let error = RoutineRunner::new(vec![good, rejected])
        .run(dataset(2))
        .unwrap_err();
    assert!(matches!(
        &error,
        EngineError::Configuration { routines } if routines == &["rejected".to_string()]
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(good_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn later_routines_append_after_earlier_ones() {
    let runner = RoutineRunner::new(vec![
        initialised("first", Box::<FlagEvery>::default(), &["Col2", "bad"]),
        initialised("second", Box::<FlagEvery>::default(), &["Col0", "questionable"]),
    ]);
    let result = runner.run(dataset(4)).unwrap();
    assert_eq!(result.state, RunState::Completed);
    for record in result.dataset.records() {
        let columns: Vec<usize> = record.messages().iter().map(Message::column_index).collect();
        assert_eq!(columns, vec![2, 0]);
        assert_eq!(record.qc_flag(), Flag::Bad);
    }
}

#[test]
fn overlapping_ranges_compound_by_max() {
    let runner = RoutineRunner::new(vec![initialised(
        "overlap",
        Box::new(OverlappingRanges),
        &[],
    )]);
    let result = runner.run(dataset(20)).unwrap();

    // (line, expected flag, expected message count)
    let mut expected = Vec::new();
    for line in 1..=5 {
        expected.push((line, Flag::Bad, 3));
    }
    for line in 6..=10 {
        expected.push((line, Flag::Bad, 3));
    }
    for line in 11..=15 {
        expected.push((line, Flag::Bad, 2));
    }
    for line in 16..=20 {
        expected.push((line, Flag::Good, 0));
    }

    let actual: Vec<(usize, Flag, usize)> = result
        .dataset
        .records()
        .iter()
        .map(|r| (r.line(), r.qc_flag(), r.messages().len()))
        .collect();
    assert_eq!(actual, expected);

    let first = result.dataset.record(1).unwrap().messages();
    let order: Vec<(&str, Flag)> = first.iter().map(|m| (m.column_name(), m.flag())).collect();
    assert_eq!(
        order,
        vec![
            ("Col1", Flag::Questionable),
            ("Col1", Flag::Questionable),
            ("Col2", Flag::Bad)
        ]
    );
}

fn builtin_specs() -> Vec<RoutineSpec> {
    vec![
        RoutineSpec::new("range_check", &["Col1", "20", "150", "15", "180"]),
        RoutineSpec::new("missing_value", &["Col2", "questionable"]),
        RoutineSpec::new("flag_propagation", &["Col1", "Col0"]),
        RoutineSpec::new("gradient", &["Col0", "0.5"]),
    ]
}

/// Run `specs` over 20 records and render every record's messages.
fn render_messages(registry: &RoutineRegistry, specs: &[RoutineSpec]) -> Vec<String> {
    let routines = build_routines(registry, specs).unwrap();
    let result = RoutineRunner::new(routines).run(dataset(20)).unwrap();
    assert_eq!(result.state, RunState::Completed);
    let added: usize = result.outcomes.iter().map(|o| o.messages_added).sum();
    assert_eq!(added, result.dataset.message_count());
    result
        .dataset
        .records()
        .iter()
        .map(|r| {
            let worst = r.messages().iter().map(Message::flag).max().unwrap_or(Flag::Good);
            assert_eq!(r.qc_flag(), worst);
            r.messages()
                .iter()
                .map(|m| format!("{}|{}|{}", m.kind(), m.summary(), m.detail()))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect()
}

#[test]
fn same_configuration_gives_identical_messages() {
    let registry = RoutineRegistry::with_builtins();
    let specs = builtin_specs();

    let first = render_messages(&registry, &specs);
    assert_eq!(first, render_messages(&registry, &specs));
    assert!(first.iter().all(|messages| !messages.is_empty()));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn any_routine_order_is_deterministic(order in prop::collection::vec(0..4usize, 0..8)) {
        let registry = RoutineRegistry::with_builtins();
        let builtins = builtin_specs();
        let specs: Vec<RoutineSpec> = order.iter().map(|&i| builtins[i].clone()).collect();

        let first = render_messages(&registry, &specs);
        prop_assert_eq!(&first, &render_messages(&registry, &specs));
        if specs.is_empty() {
            prop_assert!(first.iter().all(String::is_empty));
        }
    }
}

/// Swaps its view for one over a private copy of the records and flags
/// that copy.
struct SwapsView;

impl Routine for SwapsView {
    fn initialise(&mut self, _parameters: &[String]) -> qc_routine::Result<()> {
        Ok(())
    }

    fn process_records(&mut self, dataset: &mut DatasetView<'_>) -> qc_routine::Result<()> {
        let rows = dataset
            .records()
            .iter()
            .map(|r| r.values().to_vec())
            .collect();
        let copy = Dataset::from_rows(dataset.columns().clone(), rows)?;
        *dataset = Box::leak(Box::new(copy)).view();
        let lines: Vec<usize> = dataset.records().iter().map(|r| r.line()).collect();
        for line in lines {
            dataset.add_message(Message::new(0, "Col0", Flag::Fatal, line, "")?)?;
        }
        Ok(())
    }
}

#[test]
fn routine_cannot_replace_the_runs_records() {
    let runner = RoutineRunner::new(vec![
        initialised("A", Box::<FlagEvery>::default(), &["Col1", "bad"]),
        initialised("B", Box::new(SwapsView), &[]),
    ]);
    let result = runner.run(dataset(3)).unwrap();

    assert_eq!(result.state, RunState::Completed);
    assert_eq!(result.outcomes[1].messages_added, 0);
    assert_eq!(result.dataset.len(), 3);
    for record in result.dataset.records() {
        assert_eq!(record.qc_flag(), Flag::Bad);
        assert_eq!(record.messages().len(), 1);
    }
}

#[test]
fn dangling_cause_fails_the_routine() {
    struct DanglingCause;

    impl Routine for DanglingCause {
        fn initialise(&mut self, _parameters: &[String]) -> qc_routine::Result<()> {
            Ok(())
        }

        fn process_records(&mut self, dataset: &mut DatasetView<'_>) -> qc_routine::Result<()> {
            let message = Message::new(0, "Col0", Flag::Bad, 1, "1")?
                .with_cause(MessageId::new(2, 7));
            dataset.add_message(message)?;
            Ok(())
        }
    }

    let runner = RoutineRunner::new(vec![initialised("dangling", Box::new(DanglingCause), &[])]);
    let result = runner.run(dataset(2)).unwrap();
    assert_eq!(result.state, RunState::PartiallyFailed);
    assert!(matches!(result.failures[0].error, RoutineError::Model(_)));
    assert_eq!(result.dataset.message_count(), 0);
}

struct CancelAfterFirst {
    token: CancellationToken,
    events: Vec<String>,
}

impl ProgressSink for CancelAfterFirst {
    fn routine_started(&mut self, position: usize, total: usize, name: &str) {
        self.events.push(format!("start {position}/{total} {name}"));
    }

    fn routine_finished(&mut self, outcome: &RoutineOutcome, total: usize) {
        self.events
            .push(format!("end {}/{total} {:?}", outcome.position, outcome.status));
        self.token.cancel();
    }
}

#[test]
fn cancellation_is_checked_between_routines() {
    let token = CancellationToken::new();
    let runner = RoutineRunner::new(vec![
        initialised("one", Box::<FlagEvery>::default(), &["Col0", "questionable"]),
        initialised("two", Box::<FlagEvery>::default(), &["Col1", "bad"]),
    ])
    .with_cancellation(token.clone());
    let mut progress = CancelAfterFirst {
        token,
        events: Vec::new(),
    };

    let result = runner.run_with_progress(dataset(3), &mut progress).unwrap();
    assert_eq!(result.state, RunState::Cancelled);
    assert_eq!(
        progress.events,
        vec!["start 0/2 one", "end 0/2 Completed", "end 1/2 Skipped"]
    );
    assert!(result
        .dataset
        .records()
        .iter()
        .all(|r| r.qc_flag() == Flag::Questionable));
}

#[test]
fn report_serializes_run() {
    let runner = RoutineRunner::new(vec![
        initialised("A", Box::new(AlwaysFails), &[]),
        initialised("B", Box::<FlagEvery>::default(), &["Col1", "questionable"]),
    ]);
    let result = runner.run(dataset(3)).unwrap();
    let report = RunReport::from_result(&result);

    assert_eq!(report.records, 3);
    assert_eq!(report.messages, 3);
    assert_eq!(report.flag_counts[&Flag::Questionable], 3);
    assert_eq!(report.failures[0].name, "A");
    assert_eq!(report.messages().count(), 3);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["state"], "partially_failed");
    assert_eq!(json["flag_counts"]["questionable"], 3);
    assert_eq!(json["routines"][0]["status"], "failed");
    assert_eq!(json["flagged_records"][0]["messages"][0]["column"], "Col1");
    assert!(json["flagged_records"][0]["messages"][0].get("cause").is_none());
}
