use roverify_array::{ArrayVerifier, Grid2D};
use roverify_kernel::{Diagnostic, MemorySink, Phase, SessionOptions, Verbosity, VerifyRegion};

fn verifier(count: usize, verbosity: Verbosity) -> ArrayVerifier<MemorySink> {
    ArrayVerifier::start_with(
        "psy_stencil",
        "invoke_0",
        count,
        count,
        SessionOptions::with_verbosity(verbosity),
        MemorySink::new(),
    )
    .expect("matching counts start")
}

#[test]
fn untouched_region_is_silent() {
    let field = vec![0.5f64; 12];
    let mut v = verifier(4, Verbosity::Quiet);
    let grid = Grid2D::new(&field, 3, 4).expect("3x4");

    v.declare("n", 3i32);
    v.declare("dt", 0.1f32);
    v.declare("alpha", 1.0e-3f64);
    v.declare("u", &grid);
    v.end_declare();
    v.provide("n", 3i32);
    v.provide("dt", 0.1f32);
    v.provide("alpha", 1.0e-3f64);
    v.provide("u", &grid);
    v.pre_end();
    v.post_start();
    v.provide("n", 3i32);
    v.provide("dt", 0.1f32);
    v.provide("alpha", 1.0e-3f64);
    v.provide("u", &grid);
    let summary = v.post_end();

    assert_eq!(v.phase(), Phase::Closed);
    assert_eq!(summary.checked, 4);
    assert!(summary.is_clean());
    assert!(v.session().sink().is_empty());
}

#[test]
fn out_of_bounds_write_into_grid_is_reported() {
    let mut field = vec![1.0f64; 6];
    let mut v = verifier(1, Verbosity::Quiet);

    v.declare("u", Grid2D::new(&field, 2, 3).expect("2x3"));
    v.end_declare();
    v.provide("u", Grid2D::new(&field, 2, 3).expect("2x3"));
    v.pre_end();

    field[5] = -1.0;

    v.post_start();
    v.provide("u", Grid2D::new(&field, 2, 3).expect("2x3"));
    v.post_end();

    let records = v.session().sink().records();
    assert_eq!(records.len(), 1);
    let rendered = records[0].render();
    let heading = "f64 array (rank 2) variable u has been modified in psy_stencil::invoke_0";
    assert!(rendered.contains(heading));
    assert!(rendered.contains("Original checksum:"));
}

#[test]
fn grid_vector_members_are_checked_individually() {
    let a = vec![1.0f64; 4];
    let mut b = vec![2.0f64; 4];
    let mut v = verifier(2, Verbosity::Variable);

    {
        let grids = vec![
            Grid2D::new(&a, 2, 2).expect("2x2"),
            Grid2D::new(&b, 2, 2).expect("2x2"),
        ];
        v.declare("flux", grids.as_slice());
        v.end_declare();
        v.provide("flux", grids.as_slice());
        v.pre_end();
    }

    b[0] = 3.0;

    v.post_start();
    v.provide(
        "flux",
        vec![
            Grid2D::new(&a, 2, 2).expect("2x2"),
            Grid2D::new(&b, 2, 2).expect("2x2"),
        ],
    );
    v.post_end();

    let sink = v.session().sink();
    assert_eq!(sink.checked_variables(), vec!["flux(1)"]);
    assert_eq!(sink.modified_variables(), vec!["flux(2)"]);
    assert!(matches!(
        sink.records().last(),
        Some(Diagnostic::RegionVerified {
            checked: 2,
            modified: 1,
            ..
        })
    ));
}

#[test]
fn mutated_scalar_shows_both_values() {
    let mut v = verifier(1, Verbosity::Quiet);
    v.declare("dt", 0.5f32);
    v.end_declare();
    v.provide("dt", 0.5f32);
    v.pre_end();
    v.post_start();
    v.provide("dt", 0.25f32);
    v.post_end();

    insta::assert_snapshot!(v.session().sink().records()[0].render(), @r"
    ------------- read-only verification -------------
    f32 variable dt has been modified in psy_stencil::invoke_0
    Original value: 0.5
    New value:      0.25
    ------------- read-only verification -------------
    ");
}
