use std::num::NonZeroUsize;

use frontier_queue::{
    IndexedMinQueue, MinQueue, QueueError,
    trace::{EMPTY_MARKER, Op, generate_trace, parse_trace, replay, write_trace},
};

fn run(text: &str) -> Vec<String> {
    let ops = parse_trace(text.as_bytes()).expect("trace should parse");
    let mut queue: IndexedMinQueue<String, i64> = IndexedMinQueue::new();
    let mut lines = Vec::new();
    replay(&mut queue, &ops, true, |args| {
        lines.push(args.to_string());
        Ok(())
    })
    .expect("replay should succeed");
    lines
}

#[test]
fn test_scenario_remove_min() {
    let lines = run("a A 5\na B 3\na C 8\np\nr\ns\np\n");
    assert_eq!(lines, vec!["B 3", "B", "2", "A 5"]);
}

#[test]
fn test_scenario_decrease_and_increase() {
    let lines = run("a A 5\na A 1\np\na B 10\na A 20\np\n");
    assert_eq!(lines, vec!["A 1", "B 10"]);
}

#[test]
fn test_scenario_reverse_order() {
    let mut text = String::new();
    for i in 1..=100 {
        text.push_str(&format!("a {} {}\n", i, 101 - i));
    }
    text.push_str(&"r\n".repeat(100));

    let expected: Vec<String> = (1..=100).rev().map(|i| i.to_string()).collect();
    assert_eq!(run(&text), expected);
}

#[test]
fn test_empty_boundaries_after_clear() {
    let lines = run("a A 1\na B 2\nx\ns\np\nr\n");
    assert_eq!(lines, vec!["0", EMPTY_MARKER, EMPTY_MARKER]);
}

/// Removing everything from a generated workload yields non-decreasing priorities.
#[test]
fn test_generated_workload_drains_sorted() {
    let ops = generate_trace(20_000, NonZeroUsize::new(500).unwrap(), 99);
    let adds_only: Vec<Op> = ops
        .into_iter()
        .filter(|op| matches!(op, Op::AddOrUpdate { .. }))
        .collect();

    let mut buffer = Vec::new();
    write_trace(&adds_only, &mut buffer).unwrap();
    let ops = parse_trace(&buffer).unwrap();

    let mut queue: IndexedMinQueue<String, i64> = IndexedMinQueue::new();
    replay(&mut queue, &ops, false, |_| Ok(())).unwrap();
    assert_eq!(queue.check_invariants(), Ok(()));

    let mut last = i64::MIN;
    while !MinQueue::is_empty(&queue) {
        let (_, priority) = queue.remove_min_entry().unwrap();
        assert!(priority >= last);
        last = priority;
    }
    assert_eq!(queue.remove_min(), Err(QueueError::Empty));
}
