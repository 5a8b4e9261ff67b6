use mrlocal::standalone::engine::{perform_job, OutputSink};
use mrlocal::standalone::{Job, PartitionerKind};
use mrlocal::{utils, workload, RunConfig};
use std::fs;
use std::path::Path;

fn write_inputs(dir: &Path, files: &[(&str, &str)]) -> Vec<String> {
    files
        .iter()
        .map(|(name, text)| {
            let path = dir.join(name);
            fs::write(&path, text).unwrap();
            path.to_string_lossy().into_owned()
        })
        .collect()
}

fn job(inputs: Vec<String>, workload: &str, output: &Path, reducers: usize, args: &[&str]) -> Job {
    Job {
        inputs,
        workload: workload.to_string(),
        output: Some(output.to_path_buf()),
        partitioner: PartitionerKind::Djb2,
        config: RunConfig::new(3, reducers),
        args: args.iter().map(|s| s.to_string()).collect(),
    }
}

fn read_partitions(dir: &Path, reducers: usize) -> Vec<String> {
    (0..reducers)
        .map(|p| fs::read_to_string(dir.join(format!("mr-out-{p}"))).unwrap())
        .collect()
}

#[test]
fn word_count_writes_one_file_per_partition() {
    let input_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let inputs = write_inputs(
        input_dir.path(),
        &[("a.txt", "the quick fox\n"), ("b.txt", "the lazy fox\n")],
    );

    let stats = perform_job(
        &job(inputs, "wc", out_dir.path(), 2, &[]),
        &workload::named("wc").unwrap(),
    )
    .unwrap();

    let partitions = read_partitions(out_dir.path(), 2);
    assert_eq!(partitions[0], "fox 2\nquick 1\nthe 2\n");
    assert_eq!(partitions[1], "lazy 1\n");
    assert_eq!(stats.reduce.keys_reduced, 4);
}

#[test]
fn grep_reports_matching_lines_per_file() {
    let input_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let inputs = write_inputs(
        input_dir.path(),
        &[
            ("one.txt", "a fox here\nnothing\nanother fox\n"),
            ("two.txt", "no match\n"),
        ],
    );
    let one = inputs[0].clone();

    perform_job(
        &job(inputs, "grep", out_dir.path(), 1, &["--term", "fox"]),
        &workload::named("grep").unwrap(),
    )
    .unwrap();

    let output = read_partitions(out_dir.path(), 1).remove(0);
    assert_eq!(output, format!("{one}:1: a fox here\n{one}:3: another fox\n"));
}

#[test]
fn grep_without_term_fails() {
    let input_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let inputs = write_inputs(input_dir.path(), &[("one.txt", "fox\n")]);

    let result = perform_job(
        &job(inputs, "grep", out_dir.path(), 1, &[]),
        &workload::named("grep").unwrap(),
    );

    assert!(result.is_err());
}

#[test]
fn inverted_index_lists_each_file_once() {
    let input_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let inputs = write_inputs(
        input_dir.path(),
        &[("x.txt", "cat dog cat\n"), ("y.txt", "dog\n")],
    );
    let (x, y) = (inputs[0].clone(), inputs[1].clone());

    perform_job(
        &job(inputs, "inverted-index", out_dir.path(), 1, &[]),
        &workload::named("ii").unwrap(),
    )
    .unwrap();

    let output = read_partitions(out_dir.path(), 1).remove(0);
    assert_eq!(output, format!("cat {x}\ndog {x}, {y}\n"));
}

#[test]
fn missing_input_file_fails_the_job() {
    let input_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let missing = input_dir.path().join("absent.txt");

    let result = perform_job(
        &job(
            vec![missing.to_string_lossy().into_owned()],
            "wc",
            out_dir.path(),
            2,
            &[],
        ),
        &workload::named("wc").unwrap(),
    );

    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("absent.txt"));
}

#[test]
fn glob_inputs_expand_to_matching_files() {
    let input_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    write_inputs(
        input_dir.path(),
        &[("p1.txt", "a b\n"), ("p2.txt", "b c\n"), ("skip.md", "z\n")],
    );
    let pattern = input_dir.path().join("p*.txt").to_string_lossy().into_owned();
    let inputs = utils::expand_inputs(&[pattern]).unwrap();
    assert_eq!(inputs.len(), 2);

    perform_job(
        &job(inputs, "wc", out_dir.path(), 1, &[]),
        &workload::named("wc").unwrap(),
    )
    .unwrap();

    let output = read_partitions(out_dir.path(), 1).remove(0);
    assert_eq!(output, "a 1\nb 2\nc 1\n");
}

#[test]
fn fnv_partitioner_routes_by_ihash() {
    let input_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let inputs = write_inputs(input_dir.path(), &[("a.txt", "alpha beta gamma delta\n")]);
    let mut fnv_job = job(inputs, "wc", out_dir.path(), 3, &[]);
    fnv_job.partitioner = PartitionerKind::Fnv;

    perform_job(&fnv_job, &workload::named("wc").unwrap()).unwrap();

    let partitions = read_partitions(out_dir.path(), 3);
    for word in ["alpha", "beta", "gamma", "delta"] {
        let p = mrlocal::fnv_hash_partition(word, 3);
        assert!(partitions[p].contains(&format!("{word} 1\n")));
    }
}

#[test]
fn output_sink_rejects_unknown_partition() {
    let out_dir = tempfile::tempdir().unwrap();
    let sink = OutputSink::directory(out_dir.path(), 2).unwrap();
    sink.write(1, b"ok\n").unwrap();
    assert!(sink.write(2, b"nope\n").is_err());
    sink.finish().unwrap();
    assert_eq!(fs::read_to_string(out_dir.path().join("mr-out-1")).unwrap(), "ok\n");
    assert_eq!(fs::read_to_string(out_dir.path().join("mr-out-0")).unwrap(), "");
}
