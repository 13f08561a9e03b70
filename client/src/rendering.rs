use crate::game::ClientView;
use shared::{Board, Cell, BOARD_WIDTH};

/// Draws the board as a text grid. Empty cells show the key that plays
/// them.
pub fn render_board(board: &Board) -> String {
    let rows: Vec<String> = board
        .cells()
        .chunks(BOARD_WIDTH)
        .enumerate()
        .map(|(row, cells)| {
            let labels: Vec<String> = cells
                .iter()
                .enumerate()
                .map(|(col, cell)| match cell {
                    Cell::Empty => (row * BOARD_WIDTH + col + 1).to_string(),
                    taken => taken.to_string(),
                })
                .collect();
            format!(" {} ", labels.join(" | "))
        })
        .collect();

    rows.join("\n---+---+---\n")
}

pub struct Renderer;

impl Renderer {
    pub fn render(&self, view: &ClientView) {
        println!();
        if view.in_match || view.result.is_some() {
            println!("{}", render_board(&view.board));
            println!();
        }
        println!("{}", view.status());
        if view.can_reset() {
            println!("Press r then Enter to play again");
        }
    }
}
