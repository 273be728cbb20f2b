use std::cmp::Reverse;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use qc_engine::{MessageReport, RoutineStatus, RunReport, RunState};
use qc_model::Flag;

pub fn print_summary(report: &RunReport, max_messages: usize) {
    println!("Run: {}", state_label(report.state));
    println!(
        "Records: {}  Messages: {}  Time: {} ms",
        report.records, report.messages, report.duration_ms
    );
    print_routine_table(report);
    print_flag_table(report);
    print_message_table(report, max_messages);
    for failure in &report.failures {
        eprintln!(
            "routine {} ('{}') failed: {}",
            failure.position, failure.name, failure.error
        );
    }
}

fn print_routine_table(report: &RunReport) {
    if report.routines.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Routine"),
        header_cell("Status"),
        header_cell("Messages"),
        header_cell("Time (ms)"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Center);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    for routine in &report.routines {
        table.add_row(vec![
            dim_cell(routine.position),
            Cell::new(&routine.name),
            status_cell(routine.status),
            count_cell(routine.messages_added, Color::Yellow),
            Cell::new(routine.duration_ms),
        ]);
    }
    println!();
    println!("Routines:");
    println!("{table}");
}

fn print_flag_table(report: &RunReport) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Flag"), header_cell("Records")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for flag in Flag::ALL {
        let count = report.flag_counts.get(&flag).copied().unwrap_or_default();
        table.add_row(vec![flag_cell(flag), count_cell(count, flag_color(flag))]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(report.records).add_attribute(Attribute::Bold),
    ]);
    println!();
    println!("Flags:");
    println!("{table}");
}

fn print_message_table(report: &RunReport, max_messages: usize) {
    let mut messages: Vec<(usize, &MessageReport)> = report.messages().collect();
    if messages.is_empty() || max_messages == 0 {
        return;
    }
    messages.sort_by_key(|(line, message)| (Reverse(message.flag), *line));
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Line"),
        header_cell("Flag"),
        header_cell("Column"),
        header_cell("Value"),
        header_cell("Kind"),
        header_cell("Detail"),
    ]);
    apply_message_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 1, CellAlignment::Center);
    align_column(&mut table, 3, CellAlignment::Right);
    let hidden = messages.len().saturating_sub(max_messages);
    for (line, message) in messages.into_iter().take(max_messages) {
        table.add_row(vec![
            Cell::new(line),
            flag_cell(message.flag),
            Cell::new(&message.column),
            Cell::new(&message.value),
            dim_cell(&message.kind),
            Cell::new(&message.detail),
        ]);
    }
    println!();
    println!("Messages:");
    println!("{table}");
    if hidden > 0 {
        println!("... {hidden} more (see --output for the full report)");
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_message_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
    if table.column_count() >= 6 {
        table.set_constraints(vec![
            ColumnConstraint::LowerBoundary(Width::Fixed(6)),
            ColumnConstraint::UpperBoundary(Width::Fixed(14)),
            ColumnConstraint::UpperBoundary(Width::Fixed(16)),
            ColumnConstraint::UpperBoundary(Width::Fixed(20)),
            ColumnConstraint::UpperBoundary(Width::Fixed(18)),
            ColumnConstraint::UpperBoundary(Width::Percentage(55)),
        ]);
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn state_label(state: RunState) -> String {
    match state {
        RunState::Completed => format!("{state} (all routines succeeded)"),
        RunState::PartiallyFailed => format!("{state} (see failed routines below)"),
        RunState::Cancelled => format!("{state} (remaining routines skipped)"),
    }
}

fn status_cell(status: RoutineStatus) -> Cell {
    match status {
        RoutineStatus::Completed => Cell::new("✓").fg(Color::Green),
        RoutineStatus::Failed => Cell::new("FAILED")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        RoutineStatus::Skipped => dim_cell("skipped"),
    }
}

fn flag_cell(flag: Flag) -> Cell {
    let cell = Cell::new(flag).fg(flag_color(flag));
    if flag == Flag::Fatal {
        cell.add_attribute(Attribute::Bold)
    } else {
        cell
    }
}

fn flag_color(flag: Flag) -> Color {
    match flag {
        Flag::Good => Color::Green,
        Flag::Questionable => Color::Yellow,
        Flag::Bad | Flag::Fatal => Color::Red,
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
