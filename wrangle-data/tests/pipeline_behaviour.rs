//! Behavioural coverage for shaping, loading, reporting and auditing.

use std::cell::RefCell;

use camino::{Utf8Path, Utf8PathBuf};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;
use wrangle_core::{CleaningRules, RecordKind};
use wrangle_data::store::{load_csv_dir_to_path, report_for_path};
use wrangle_data::{
    AuditReport, MapReport, ProcessOptions, ProcessSummary, audit_file, csv_file_name,
    process_map_to_dir,
};

struct PipelineWorld {
    temp: TempDir,
    input: RefCell<Option<Utf8PathBuf>>,
    summary: RefCell<Option<ProcessSummary>>,
    report: RefCell<Option<MapReport>>,
    audit: RefCell<Option<AuditReport>>,
}

impl PipelineWorld {
    fn root(&self) -> &Utf8Path {
        Utf8Path::from_path(self.temp.path()).expect("temp dir should be UTF-8")
    }

    fn output_dir(&self) -> Utf8PathBuf {
        self.root().join("out")
    }

    fn input(&self) -> Utf8PathBuf {
        self.input
            .borrow()
            .clone()
            .expect("input should be selected")
    }

    fn shape(&self, validate: bool) {
        let options = ProcessOptions::default().with_validation(validate);
        let summary = process_map_to_dir(&self.input(), &self.output_dir(), &options)
            .expect("shaping should succeed");
        self.summary.replace(Some(summary));
    }

    fn summary(&self) -> ProcessSummary {
        self.summary.borrow().expect("extract should have been shaped")
    }

    fn table(&self, kind: RecordKind) -> String {
        std::fs::read_to_string(self.output_dir().join(csv_file_name(kind)))
            .expect("CSV table should exist")
    }

    fn report(&self) -> MapReport {
        self.report
            .borrow()
            .clone()
            .expect("report should have run")
    }

    fn audit(&self) -> AuditReport {
        self.audit
            .borrow()
            .clone()
            .expect("audit should have run")
    }
}

#[fixture]
fn world() -> PipelineWorld {
    PipelineWorld {
        temp: TempDir::new().expect("create temp dir"),
        input: RefCell::new(None),
        summary: RefCell::new(None),
        report: RefCell::new(None),
        audit: RefCell::new(None),
    }
}

#[given("the sample extract")]
fn given_sample(#[from(world)] world: &PipelineWorld) {
    let path = Utf8Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample.osm");
    world.input.replace(Some(path));
}

#[when("the extract is shaped into a fresh directory")]
fn when_shaped(#[from(world)] world: &PipelineWorld) {
    world.shape(false);
}

#[when("the extract is shaped with validation into a fresh directory")]
fn when_shaped_validated(#[from(world)] world: &PipelineWorld) {
    world.shape(true);
}

#[when("the tables are loaded into a database")]
fn when_loaded(#[from(world)] world: &PipelineWorld) {
    let database = world.root().join("db/map.db");
    load_csv_dir_to_path(&world.output_dir(), &database).expect("load should succeed");
    let report = report_for_path(&database).expect("report should succeed");
    world.report.replace(Some(report));
}

#[when("the extract is audited")]
fn when_audited(#[from(world)] world: &PipelineWorld) {
    let report =
        audit_file(&world.input(), &CleaningRules::default()).expect("audit should succeed");
    world.audit.replace(Some(report));
}

#[then("{nodes} nodes and {ways} ways are written")]
fn then_written(#[from(world)] world: &PipelineWorld, nodes: u64, ways: u64) {
    let summary = world.summary();
    assert_eq!(summary.nodes, nodes);
    assert_eq!(summary.ways, ways);
}

#[then("{count} relation is skipped")]
fn then_relations(#[from(world)] world: &PipelineWorld, count: u64) {
    assert_eq!(world.summary().relations_skipped, count);
}

#[then("{count} tag is dropped")]
fn then_dropped(#[from(world)] world: &PipelineWorld, count: u64) {
    assert_eq!(world.summary().dropped_tags, count);
}

#[then("the nodes_tags table contains the row \"{row}\"")]
fn then_node_tag_row(#[from(world)] world: &PipelineWorld, row: String) {
    let table = world.table(RecordKind::NodeTag);
    assert!(table.lines().any(|line| line == row), "{row} missing from:\n{table}");
}

#[then("the ways_tags table contains the row \"{row}\"")]
fn then_way_tag_row(#[from(world)] world: &PipelineWorld, row: String) {
    let table = world.table(RecordKind::WayTag);
    assert!(table.lines().any(|line| line == row), "{row} missing from:\n{table}");
}

#[then("the report counts {count} unique users")]
fn then_unique_users(#[from(world)] world: &PipelineWorld, count: u64) {
    assert_eq!(world.report().unique_users, count);
}

#[then("the report counts {cafes} cafe, {schools} school and {casinos} casino")]
fn then_amenities(
    #[from(world)] world: &PipelineWorld,
    cafes: u64,
    schools: u64,
    casinos: u64,
) {
    let report = world.report();
    assert_eq!(
        (report.cafes, report.schools, report.casinos),
        (cafes, schools, casinos)
    );
}

#[then("the most popular religion is \"{religion}\"")]
fn then_religion(#[from(world)] world: &PipelineWorld, religion: String) {
    assert_eq!(world.report().most_popular_religion, Some(religion));
}

#[then("the top contributor is \"{user}\" with {edits} edits")]
fn then_top_user(#[from(world)] world: &PipelineWorld, user: String, edits: u64) {
    let report = world.report();
    let top = report.top_users.first().expect("at least one contributor");
    assert_eq!(top.user, user);
    assert_eq!(top.contributions, edits);
}

#[then("the street suffix \"{suffix}\" is flagged for \"{street}\"")]
fn then_street_flagged(#[from(world)] world: &PipelineWorld, suffix: String, street: String) {
    let audit = world.audit();
    let names = audit
        .unexpected_street_types
        .get(&suffix)
        .expect("suffix should be flagged");
    assert!(names.contains(&street));
}

#[then("the city \"{city}\" is flagged")]
fn then_city_flagged(#[from(world)] world: &PipelineWorld, city: String) {
    assert!(world.audit().unexpected_cities.contains(&city));
}

#[then("the state \"{state}\" is flagged")]
fn then_state_flagged(#[from(world)] world: &PipelineWorld, state: String) {
    assert!(world.audit().unexpected_states.contains(&state));
}

#[then("{count} users contributed")]
fn then_users(#[from(world)] world: &PipelineWorld, count: usize) {
    assert_eq!(world.audit().unique_user_count(), count);
}

#[scenario(path = "tests/features/pipeline.feature", index = 0)]
fn shapes_sample_extract(#[from(world)] world: PipelineWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/pipeline.feature", index = 1)]
fn validates_while_shaping(#[from(world)] world: PipelineWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/pipeline.feature", index = 2)]
fn loads_and_reports(#[from(world)] world: PipelineWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/pipeline.feature", index = 3)]
fn audits_sample_extract(#[from(world)] world: PipelineWorld) {
    let _ = world;
}
