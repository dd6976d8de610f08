//! Board renderer capability and a plain-text implementation.

use shakmaty::Color;

/// What the controller needs from a board front end. The bundled binary uses
/// [`TextBoard`]; tests inject a recording double.
pub trait BoardRenderer {
    /// Show the standard initial position.
    fn start(&mut self);

    /// Show the given position.
    fn render(&mut self, fen: &str);

    /// Which side sits at the bottom of the display.
    fn set_orientation(&mut self, color: Color);

    /// Mirror the display.
    fn flip(&mut self);
}

/// ASCII board printed to stdout.
pub struct TextBoard {
    orientation: Color,
}

impl TextBoard {
    pub fn new() -> Self {
        Self {
            orientation: Color::White,
        }
    }
}

impl Default for TextBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardRenderer for TextBoard {
    fn start(&mut self) {
        self.render(chess_core::STARTING_FEN);
    }

    fn render(&mut self, fen: &str) {
        println!("{}", draw(fen, self.orientation));
    }

    fn set_orientation(&mut self, color: Color) {
        self.orientation = color;
    }

    fn flip(&mut self) {
        self.orientation = !self.orientation;
    }
}

/// Render a FEN's piece placement as an 8x8 letter grid, ranks labelled,
/// with the orientation color at the bottom.
pub fn draw(fen: &str, orientation: Color) -> String {
    let mut fields = fen.split_whitespace();
    let placement = fields.next().unwrap_or("");
    let side_to_move = fields.next().unwrap_or("?");

    // grid[rank][file], rank 0 = rank 1, file 0 = the a-file
    let mut grid = [['.'; 8]; 8];
    let mut rank: usize = 7;
    let mut file: usize = 0;
    for c in placement.chars() {
        match c {
            '/' => {
                rank = rank.saturating_sub(1);
                file = 0;
            }
            '1'..='8' => file += c as usize - '0' as usize,
            piece => {
                if file < 8 {
                    grid[rank][file] = piece;
                    file += 1;
                }
            }
        }
    }

    let ranks: Vec<usize> = match orientation {
        Color::White => (0..8).rev().collect(),
        Color::Black => (0..8).collect(),
    };
    let files: Vec<usize> = match orientation {
        Color::White => (0..8).collect(),
        Color::Black => (0..8).rev().collect(),
    };

    let mut out = String::new();
    for r in &ranks {
        out.push_str(&format!("{} ", r + 1));
        for f in &files {
            out.push(' ');
            out.push(grid[*r][*f]);
        }
        out.push('\n');
    }
    out.push_str("  ");
    for f in &files {
        out.push(' ');
        out.push((b'a' + *f as u8) as char);
    }
    out.push_str(&format!("\n{} to move", if side_to_move == "w" { "white" } else { "black" }));
    out
}
