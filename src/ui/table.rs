use eframe::egui::{Align, Layout, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::Table;

const ROW_HEIGHT: f32 = 18.0;
const MAX_HEIGHT: f32 = 400.0;

/// Scrollable grid of every row; numeric columns right-aligned.
pub fn data_table(ui: &mut Ui, id: &str, table: &Table) {
    if table.is_empty() {
        ui.label("No rows match the current filters.");
        return;
    }

    let numeric: Vec<bool> = (0..table.columns().len())
        .map(|idx| table.is_numeric_column(idx))
        .collect();

    ui.push_id(id, |ui: &mut Ui| {
        ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .max_scroll_height(MAX_HEIGHT)
                .columns(Column::auto().at_least(60.0), table.columns().len())
                .header(ROW_HEIGHT + 2.0, |mut header| {
                    for name in table.columns() {
                        header.col(|ui| {
                            ui.strong(name);
                        });
                    }
                })
                .body(|body| {
                    body.rows(ROW_HEIGHT, table.len(), |mut row| {
                        let cells = &table.rows()[row.index()];
                        for (cell, is_numeric) in cells.iter().zip(&numeric) {
                            row.col(|ui| {
                                if *is_numeric {
                                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                                        ui.label(cell.to_string());
                                    });
                                } else {
                                    ui.label(cell.to_string());
                                }
                            });
                        }
                    });
                });
        });
    });
}
