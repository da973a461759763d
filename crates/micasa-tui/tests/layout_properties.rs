// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use micasa_testkit::{ColumnPattern, HomeFaker};
use micasa_tui::columns::{ColumnModel, ColumnSpec};
use micasa_tui::layout::{Separator, compute_layout};
use micasa_tui::stacks::{plain_text, render_stack_lines};

fn specs_from(pattern: &ColumnPattern) -> Vec<ColumnSpec> {
    pattern
        .titles
        .iter()
        .zip(&pattern.widths)
        .zip(&pattern.hide_orders)
        .map(|((title, width), order)| ColumnSpec::new(title.clone(), *width).hidden(*order))
        .collect()
}

fn spec(title: &str, width: u16, hide_order: u32) -> ColumnSpec {
    ColumnSpec::new(title, width).hidden(hide_order)
}

/// Runs of adjacent hidden columns. Each run is one candidate stack.
fn hidden_runs(specs: &[ColumnSpec]) -> usize {
    let mut runs = 0;
    let mut in_run = false;
    for spec in specs {
        if spec.is_hidden() && !in_run {
            runs += 1;
        }
        in_run = spec.is_hidden();
    }
    runs
}

#[test]
fn random_patterns_keep_every_hidden_column_exactly_once() -> Result<()> {
    let mut faker = HomeFaker::new(7);
    for round in 0..200 {
        let columns = 1 + faker.int_n(12);
        let pattern = faker.column_pattern(columns);
        let specs = specs_from(&pattern);
        let width = 20 + faker.int_n(160) as u16;
        let layout = compute_layout(&specs, width)?;

        let hidden = specs.iter().filter(|spec| spec.is_hidden()).count();
        if hidden == specs.len() {
            assert!(layout.columns.is_empty(), "round {round}");
            assert!(layout.stacks.is_empty(), "round {round}");
            continue;
        }

        let entries = layout
            .stacks
            .iter()
            .map(|stack| stack.entries.len())
            .sum::<usize>();
        assert_eq!(entries, hidden, "round {round}: {pattern:?}");
        assert!(layout.stacks.len() <= hidden_runs(&specs), "round {round}");
        assert!(layout.stacks.len() <= layout.columns.len() + 1, "round {round}");

        let vis_to_full = layout.vis_to_full();
        assert!(
            vis_to_full.windows(2).all(|pair| pair[0] < pair[1]),
            "round {round}"
        );
        assert_eq!(layout.separators.len(), layout.columns.len() - 1);
    }
    Ok(())
}

#[test]
fn random_patterns_never_overlap_or_overflow() -> Result<()> {
    let mut faker = HomeFaker::new(99);
    for round in 0..200 {
        let columns = 2 + faker.int_n(10);
        let specs = specs_from(&faker.column_pattern(columns));
        let width = 10 + faker.int_n(120) as u16;
        let layout = compute_layout(&specs, width)?;

        for stack in &layout.stacks {
            assert!(stack.end() <= layout.total_width, "round {round}");
            let orders = stack
                .entries
                .iter()
                .map(|entry| entry.full_index)
                .collect::<Vec<_>>();
            assert!(
                orders.windows(2).all(|pair| pair[0] > pair[1]),
                "round {round}: entries must sort by full index descending"
            );
        }
        for (index, a) in layout.stacks.iter().enumerate() {
            for b in &layout.stacks[index + 1..] {
                assert!(
                    a.end() <= b.offset || b.end() <= a.offset,
                    "round {round}: {a:?} overlaps {b:?}"
                );
            }
        }
    }
    Ok(())
}

#[test]
fn layout_is_idempotent() -> Result<()> {
    let mut faker = HomeFaker::new(3);
    for _ in 0..50 {
        let specs = specs_from(&faker.column_pattern(8));
        assert_eq!(compute_layout(&specs, 90)?, compute_layout(&specs, 90)?);
    }
    Ok(())
}

#[test]
fn hide_then_show_round_trips_mapping() {
    let mut faker = HomeFaker::new(11);
    for _ in 0..50 {
        let mut columns = ColumnModel::new(specs_from(&faker.column_pattern(9)));
        let before = columns.vis_to_full();
        let Some(&target) = before.first() else {
            continue;
        };
        assert!(columns.hide(target));
        assert!(columns.show(target));
        assert_eq!(columns.vis_to_full(), before);
    }
}

#[test]
fn stack_lines_match_depth_and_badges() -> Result<()> {
    let mut faker = HomeFaker::new(21);
    for _ in 0..50 {
        let specs = specs_from(&faker.column_pattern(10));
        let layout = compute_layout(&specs, 120)?;
        let lines = render_stack_lines(&layout.stacks);
        let depth = layout
            .stacks
            .iter()
            .map(|stack| stack.entries.len())
            .max()
            .unwrap_or(0);
        assert_eq!(lines.len(), depth);
        for (level, line) in lines.iter().enumerate() {
            let badges = layout
                .stacks
                .iter()
                .filter(|stack| stack.entries.len() > level)
                .count();
            let styled = line
                .spans
                .iter()
                .filter(|span| span.style.bg.is_some())
                .count();
            assert_eq!(styled, badges);
        }
    }
    Ok(())
}

#[test]
fn interior_run_stacks_most_recent_nearest_the_gap() -> Result<()> {
    let specs = vec![
        spec("ID", 4, 0),
        spec("Title", 20, 0),
        spec("Type", 10, 1),
        spec("Status", 10, 2),
        spec("Start", 10, 0),
    ];
    let layout = compute_layout(&specs, 80)?;

    assert_eq!(layout.vis_to_full(), vec![0, 1, 4]);
    assert_eq!(
        layout.separators,
        vec![Separator::Plain, Separator::Collapsed]
    );
    assert_eq!(layout.stacks.len(), 1);
    let stack = &layout.stacks[0];
    assert!(!stack.edge);
    let titles = stack
        .entries
        .iter()
        .map(|entry| entry.title.as_str())
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["Status", "Type"]);

    let lines = render_stack_lines(&layout.stacks);
    assert_eq!(lines.len(), 2);
    assert!(plain_text(&lines[0]).contains("Status"));
    assert!(plain_text(&lines[1]).contains("Type"));
    Ok(())
}

#[test]
fn all_visible_means_no_stacks() -> Result<()> {
    let specs = ["ID", "Title", "Type", "Status", "Start"]
        .into_iter()
        .map(|title| spec(title, 8, 0))
        .collect::<Vec<_>>();
    let layout = compute_layout(&specs, 80)?;
    assert!(layout.stacks.is_empty());
    assert!(layout.separators.iter().all(|sep| *sep == Separator::Plain));
    assert!(!layout.leading && !layout.trailing);
    Ok(())
}

#[test]
fn hiding_first_and_last_makes_two_edge_stacks() -> Result<()> {
    let specs = vec![
        spec("ID", 10, 1),
        spec("Title", 10, 0),
        spec("Type", 10, 0),
        spec("Status", 10, 0),
        spec("End", 10, 2),
    ];
    let layout = compute_layout(&specs, 80)?;

    assert_eq!(layout.stacks.len(), 2);
    assert!(layout.stacks.iter().all(|stack| stack.edge));
    assert!(layout.leading && layout.trailing);
    assert_eq!(layout.stacks[0].offset, 0);
    assert_eq!(layout.stacks[1].end(), layout.total_width);
    Ok(())
}
