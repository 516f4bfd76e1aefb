use std::path::PathBuf;
use test_generator::test_resources;
use tinyasm::{engine::EngineOptions, error::Result, run_source};

const MAX_STEPS: u64 = 100_000;

#[test_resources("tests/data/*.asm")]
fn test_passing(path: &str) {
    run_passing_test(path).unwrap();
}

#[test_resources("tests/failing/*.asm")]
fn test_failing(path: &str) {
    run_failing_test(path);
}

fn run_test(file: &str, source: &str) -> Result<String> {
    println!("RUNNING '{}'...", file);

    let options = EngineOptions {
        max_steps: Some(MAX_STEPS),
    };
    let registers = run_source(source, options)?;

    Ok(registers.to_string())
}

pub fn run_passing_test(file: &str) -> Result<()> {
    let source = std::fs::read_to_string(file).unwrap();
    let expected = std::fs::read_to_string(PathBuf::from(file).with_extension("txt")).unwrap();

    let output = run_test(file, &source)?;
    assert_eq!(output.trim(), expected.trim());

    Ok(())
}

pub fn run_failing_test(file: &str) {
    let source = std::fs::read_to_string(file).unwrap();

    let expected = source
        .lines()
        .find(|x| x.trim_start().starts_with("; Expected: "))
        .map(|x| x.trim_start().replace("; Expected: ", ""));

    let result = run_test(file, &source);
    assert!(result.is_err());

    if let Some(expected) = expected {
        assert_eq!(result.unwrap_err().message.trim(), expected.trim());
    }
}
