//! UI rendering for the terminal front-end.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::cpu::display::{Display, HEIGHT, WIDTH};
use crate::cpu::{CpuState, Keypad, Memory};
use super::app::EmulatorApp;
use super::keymap::physical_key;

/// Hex keypad layout, top row first.
const KEYPAD_LAYOUT: [[u8; 4]; 4] = [
    [0x1, 0x2, 0x3, 0xC],
    [0x4, 0x5, 0x6, 0xD],
    [0x7, 0x8, 0x9, 0xE],
    [0xA, 0x0, 0xB, 0xF],
];

/// Bytes per memory panel row.
const MEMORY_ROW: usize = 8;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &EmulatorApp) {
    let columns = if app.show_debug {
        vec![Constraint::Length(WIDTH as u16 + 2), Constraint::Min(30)]
    } else {
        vec![Constraint::Min(WIDTH as u16 + 2)]
    };
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(columns)
        .split(frame.area());

    // Left side: screen and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEIGHT as u16 / 2 + 2),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(chunks[0]);

    draw_screen(frame, left_chunks[0], app);
    draw_status(frame, left_chunks[1], app);

    if app.show_debug {
        // Right side: registers, disassembly, memory and keypad
        let right_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(10),
                Constraint::Min(6),
                Constraint::Length(6),
                Constraint::Length(7),
            ])
            .split(chunks[1]);

        draw_registers(frame, right_chunks[0], app);
        draw_disassembly(frame, right_chunks[1], app);
        draw_memory(frame, right_chunks[2], app);
        draw_help(frame, right_chunks[3], app);
    }
}

/// Render the framebuffer two pixel rows per text row using half blocks.
pub fn screen_lines(display: &Display) -> Vec<String> {
    (0..HEIGHT)
        .step_by(2)
        .map(|y| {
            (0..WIDTH)
                .map(|x| match (display.pixel(x, y), display.pixel(x, y + 1)) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                })
                .collect()
        })
        .collect()
}

/// Hex dump rows starting at the row containing `addr`.
pub fn memory_lines(mem: &Memory, addr: u16, rows: usize) -> Vec<String> {
    let start = addr as usize / MEMORY_ROW * MEMORY_ROW;
    mem.dump(start, rows * MEMORY_ROW)
        .chunks(MEMORY_ROW)
        .map(|row| {
            let bytes: Vec<String> = row.iter().map(|(_, b)| format!("{:02X}", b)).collect();
            format!("{:03X}: {}", row[0].0, bytes.join(" "))
        })
        .collect()
}

/// Keypad cells as `(label, pressed)`, labelled `key[keyboard key]`.
pub fn keypad_cells(keypad: &Keypad) -> Vec<Vec<(String, bool)>> {
    let keys = keypad.keys();
    KEYPAD_LAYOUT
        .iter()
        .map(|row| {
            row.iter()
                .map(|&key| {
                    let bound = physical_key(key).unwrap_or('?');
                    (format!("{:X}[{}]", key, bound), keys[key as usize] != 0)
                })
                .collect()
        })
        .collect()
}

/// Draw the Chip-8 screen.
fn draw_screen(frame: &mut Frame, area: Rect, app: &EmulatorApp) {
    let cpu = app.driver.cpu();
    let lines: Vec<Line> = screen_lines(cpu.display())
        .into_iter()
        .map(Line::from)
        .collect();

    let title = if cpu.regs.sound_active() { " Chip-8 ♪ " } else { " Chip-8 " };
    let screen = Paragraph::new(lines)
        .style(Style::default().fg(Color::Green))
        .block(Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(screen, area);
}

/// Draw register state.
fn draw_registers(frame: &mut Frame, area: Rect, app: &EmulatorApp) {
    let cpu = app.driver.cpu();
    let regs = &cpu.regs;

    let mut content: Vec<Line> = regs.v
        .chunks(4)
        .enumerate()
        .map(|(row, chunk)| {
            let spans: Vec<Span> = chunk
                .iter()
                .enumerate()
                .map(|(col, value)| {
                    let index = row * 4 + col;
                    Span::raw(format!("V{:X}={:02X}  ", index, value))
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    content.push(Line::from(vec![
        Span::raw("PC: "),
        Span::styled(format!("{:#05x}", regs.pc), Style::default().fg(Color::Yellow)),
        Span::raw("   I: "),
        Span::styled(format!("{:#05x}", regs.i), Style::default().fg(Color::White)),
        Span::raw(format!("   SP: {}", regs.sp)),
    ]));
    content.push(Line::from(format!(
        "DT: {:3}   ST: {:3}   Cycles: {}",
        regs.delay_timer, regs.sound_timer, cpu.cycles
    )));
    let stack: Vec<String> = regs.call_stack().iter().map(|a| format!("{:03X}", a)).collect();
    content.push(Line::from(format!("Stack: [{}]", stack.join(" "))));
    content.push(Line::from(vec![
        Span::raw("State: "),
        Span::styled(format!("{:?}", cpu.state), state_style(cpu.state)),
    ]));

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw disassembly view around the PC.
fn draw_disassembly(frame: &mut Frame, area: Rect, app: &EmulatorApp) {
    let disasm = app.get_disassembly((area.height as usize).saturating_sub(2));

    let items: Vec<ListItem> = disasm
        .iter()
        .map(|(addr, instr, is_current)| {
            let prefix = if *is_current { "▶ " } else { "  " };
            let text = format!("{}{:#05x}: {}", prefix, addr, instr);

            let style = if *is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            ListItem::new(text).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Disassembly ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw memory around I.
fn draw_memory(frame: &mut Frame, area: Rect, app: &EmulatorApp) {
    let cpu = app.driver.cpu();
    let rows = (area.height as usize).saturating_sub(2);
    let lines: Vec<Line> = memory_lines(&cpu.mem, cpu.regs.i, rows)
        .into_iter()
        .map(Line::from)
        .collect();

    let paragraph = Paragraph::new(lines)
        .block(Block::default()
            .title(" Memory @ I ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue)));

    frame.render_widget(paragraph, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &EmulatorApp) {
    let style = if app.halted {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::White)
    };
    let status = Paragraph::new(app.status.clone())
        .style(style)
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw keypad and help panel. Held keys are highlighted.
fn draw_help(frame: &mut Frame, area: Rect, app: &EmulatorApp) {
    let mut content: Vec<Line> = keypad_cells(app.driver.cpu().keypad())
        .into_iter()
        .map(|row| {
            let spans: Vec<Span> = row
                .into_iter()
                .map(|(label, pressed)| {
                    let style = if pressed {
                        Style::default().fg(Color::Black).bg(Color::Yellow)
                    } else {
                        Style::default().fg(Color::DarkGray)
                    };
                    Span::styled(format!("{} ", label), style)
                })
                .collect();
            Line::from(spans)
        })
        .collect();
    content.push(Line::styled(
        "Space: Pause  n: Step  x: Reset  Tab: Panel  q: Quit",
        Style::default().fg(Color::DarkGray),
    ));

    let help = Paragraph::new(content)
    .block(Block::default()
        .title(" Keypad ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}

/// Get color style for an execution state.
fn state_style(state: CpuState) -> Style {
    match state {
        CpuState::Running => Style::default().fg(Color::Green),
        CpuState::AwaitingKey { .. } => Style::default().fg(Color::Yellow),
        CpuState::Faulted => Style::default().fg(Color::Red),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_lines_half_blocks() {
        let mut display = Display::new();
        // (0,0) and (0,1) lit; (1,0) lit; (2,1) lit
        display.draw_sprite(0, 0, &[0b1100_0000, 0b1010_0000]);

        let lines = screen_lines(&display);
        assert_eq!(lines.len(), HEIGHT / 2);
        let first: Vec<char> = lines[0].chars().collect();
        assert_eq!(first.len(), WIDTH);
        assert_eq!(&first[..4], &['█', '▀', '▄', ' ']);
    }

    #[test]
    fn test_memory_lines_align_to_row() {
        let mem = Memory::new();
        let lines = memory_lines(&mem, 0x53, 2);
        assert_eq!(lines, vec![
            "050: F0 90 90 90 F0 20 60 20".to_string(),
            "058: 20 70 F0 10 F0 80 F0 F0".to_string(),
        ]);

        // Clamped at the end of memory.
        assert_eq!(memory_lines(&mem, 0xFFC, 4).len(), 1);
        assert!(memory_lines(&mem, 0xFFFF, 4).is_empty());
    }

    #[test]
    fn test_keypad_cells_show_binding_and_state() {
        let mut keypad = Keypad::new();
        keypad.set(0xC, true).unwrap();

        let cells = keypad_cells(&keypad);
        assert_eq!(cells[0][3], ("C[0]".to_string(), true));
        assert_eq!(cells[3][1], ("0[,]".to_string(), false));
        assert_eq!(cells.iter().flatten().filter(|(_, pressed)| *pressed).count(), 1);
    }
}
