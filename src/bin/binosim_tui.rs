//! binosim - Terminal User Interface
//!
//! Interactive Bernoulli trial simulator rendered with ratatui.
//! App logic lives in `binosim::tui::simulator_app`.

#![forbid(unsafe_code)]

#[cfg(feature = "tui")]
fn main() -> std::io::Result<()> {
    use binosim::config::SimConfig;
    use binosim::tui::simulator_app::SimulatorApp;

    init_logging();

    let args: Vec<String> = std::env::args().collect();
    let config = match args.get(1) {
        Some(path) => match SimConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading '{path}': {e}");
                eprintln!("Usage: binosim-tui [config.yaml]");
                std::process::exit(1);
            }
        },
        None => SimConfig::default(),
    };

    let frame = config.visualization.tui.frame_interval();
    tui::run(SimulatorApp::new(&config), frame)
}

/// Log to stderr only when `BINOSIM_LOG` is set, so the alternate screen
/// stays clean by default.
#[cfg(feature = "tui")]
fn init_logging() {
    if let Ok(filter) = std::env::var("BINOSIM_LOG") {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

#[cfg(not(feature = "tui"))]
fn main() {
    eprintln!("TUI feature not enabled. Run with: cargo run --bin binosim-tui --features tui");
    std::process::exit(1);
}

#[cfg(feature = "tui")]
mod tui {
    use binosim::engine::params::ParamField;
    use binosim::engine::RunOutcome;
    use binosim::tui::simulator_app::SimulatorApp;
    use crossterm::{
        event::{self, Event, KeyEventKind},
        execute,
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    };
    use ratatui::{
        backend::CrosstermBackend,
        layout::{Constraint, Direction, Layout, Rect},
        style::{Color, Modifier, Style},
        text::{Line, Span},
        widgets::{Bar, BarChart, BarGroup, Block, Borders, Gauge, Paragraph},
        Frame, Terminal,
    };
    use std::io;
    use std::time::{Duration, Instant};

    pub fn run(mut app: SimulatorApp, frame: Duration) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, crossterm::cursor::Hide)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = run_main_loop(&mut terminal, &mut app, frame);

        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::cursor::Show
        )?;

        result
    }

    fn run_main_loop(
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        app: &mut SimulatorApp,
        frame: Duration,
    ) -> io::Result<()> {
        let mut last_tick = Instant::now();

        loop {
            terminal.draw(|f| ui(f, app))?;

            // Poll no longer than the pacing delay so fast runs keep up.
            let tick_rate = frame.min(app.sim.delay()).max(Duration::from_millis(1));
            let timeout = tick_rate.saturating_sub(last_tick.elapsed());
            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        app.handle_key(key.code);
                    }
                }
            }

            let elapsed = last_tick.elapsed();
            if elapsed >= tick_rate {
                app.tick(elapsed);
                last_tick = Instant::now();
            }

            if app.should_quit() {
                break;
            }
        }

        Ok(())
    }

    fn ui(f: &mut Frame, app: &SimulatorApp) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(5),
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
            ])
            .split(f.area());

        render_title(f, chunks[0], app);
        render_params(f, chunks[1], app);
        render_progress(f, chunks[2], app);

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(chunks[3]);

        render_histogram(f, main_chunks[0], app);

        let right_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10), Constraint::Length(7)])
            .split(main_chunks[1]);

        render_stats(f, right_chunks[0], app);
        render_selected(f, right_chunks[1], app);

        render_status_bar(f, chunks[4], app);
    }

    fn render_title(f: &mut Frame, area: Rect, app: &SimulatorApp) {
        let (state, color) = if app.sim.is_running() {
            ("RUNNING", Color::Green)
        } else {
            match app.sim.outcome() {
                RunOutcome::Completed => ("COMPLETED", Color::Cyan),
                RunOutcome::Cancelled => ("STOPPED", Color::Yellow),
                RunOutcome::Faulted => ("FAULTED", Color::Red),
                RunOutcome::Idle => ("IDLE", Color::Gray),
            }
        };

        let title = Paragraph::new(Line::from(vec![
            Span::styled(
                " Bernoulli Trial Simulator ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("- binomial histogram and z-test "),
            Span::styled(
                format!("[{state}]"),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
        ]))
        .block(Block::default().borders(Borders::ALL).title("binosim"));
        f.render_widget(title, area);
    }

    fn param_line<'a>(
        app: &'a SimulatorApp,
        field: ParamField,
        label: &'a str,
        hint: String,
    ) -> Line<'a> {
        let focused = app.focus == field;
        let invalid = app.is_field_invalid(field);
        let value_style = if invalid {
            Style::default().fg(Color::White).bg(Color::Red)
        } else if focused {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::Yellow)
        };
        let marker = if focused { "▶ " } else { "  " };

        let mut spans = vec![
            Span::raw(marker),
            Span::styled(label, Style::default().fg(Color::Gray)),
            Span::styled(app.input(field), value_style),
            Span::styled(format!("  {hint}"), Style::default().fg(Color::Gray)),
        ];
        if invalid {
            spans.push(Span::styled("  invalid", Style::default().fg(Color::Red)));
        }
        Line::from(spans)
    }

    fn render_params(f: &mut Frame, area: Rect, app: &SimulatorApp) {
        let params = app.sim.params();
        let lines = vec![
            param_line(
                app,
                ParamField::Probability,
                "Probability of success: ",
                params.probability_label(),
            ),
            param_line(app, ParamField::Trials, "Trials per experiment:  ", String::new()),
            param_line(
                app,
                ParamField::Experiments,
                "Number of experiments:  ",
                format!("delay {} ms", app.delay_ms()),
            ),
        ];

        let panel = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Parameters (Tab: next field, Enter: apply)")
                .border_style(Style::default().fg(Color::Yellow)),
        );
        f.render_widget(panel, area);
    }

    fn render_progress(f: &mut Frame, area: Rect, app: &SimulatorApp) {
        let total = app.sim.params().number_of_experiments;
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Progress"))
            .gauge_style(Style::default().fg(Color::Green))
            .ratio(app.progress_ratio())
            .label(format!("{} / {total}", app.sim.progress()));
        f.render_widget(gauge, area);
    }

    fn render_histogram(f: &mut Frame, area: Rect, app: &SimulatorApp) {
        let histogram = app.sim.histogram();
        let selected = app.sim.selected_index();

        let bars: Vec<Bar> = histogram
            .labels
            .iter()
            .zip(&histogram.data)
            .enumerate()
            .map(|(i, (label, &count))| {
                let style = if selected == Some(i) {
                    Style::default().fg(Color::Magenta)
                } else {
                    Style::default().fg(Color::Cyan)
                };
                Bar::default()
                    .value(count)
                    .label(Line::from(label.clone()))
                    .style(style)
            })
            .collect();

        let inner_width = area.width.saturating_sub(2) as usize;
        let bar_count = bars.len().max(1);
        let bar_width = (inner_width / bar_count).saturating_sub(1).clamp(1, 8) as u16;

        let chart = BarChart::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Histogram ({} bins, ←/→ select)", histogram.len())),
            )
            .data(BarGroup::default().bars(&bars))
            .bar_width(bar_width)
            .bar_gap(1)
            .max(histogram.max_frequency().max(1));
        f.render_widget(chart, area);
    }

    fn render_stats(f: &mut Frame, area: Rect, app: &SimulatorApp) {
        let stats = app.sim.statistics();
        let row = |name: &'static str, value: String| {
            Line::from(vec![
                Span::raw(name),
                Span::styled(value, Style::default().fg(Color::Yellow)),
            ])
        };
        let significant = stats.is_significant(0.05) && !app.sim.results().is_empty();

        let lines = vec![
            row("Mean:      ", format!("{:.3}", stats.mean)),
            row("Variance:  ", format!("{:.3}", stats.variance)),
            row("Std dev:   ", format!("{:.3}", stats.standard_deviation)),
            row("Min / Max: ", format!("{} / {}", stats.min, stats.max)),
            row("Expected:  ", format!("{:.3}", stats.expected_value)),
            row("z-score:   ", format!("{:.3}", stats.z_score)),
            Line::from(vec![
                Span::raw("p-value:   "),
                Span::styled(
                    format!("{:.4}", stats.p_value),
                    Style::default().fg(if significant { Color::Red } else { Color::Green }),
                ),
            ]),
        ];

        let panel = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Statistics ({} results)", app.sim.results().len())),
        );
        f.render_widget(panel, area);
    }

    fn render_selected(f: &mut Frame, area: Rect, app: &SimulatorApp) {
        let lines = app.sim.selected_bar_stats().map_or_else(
            || vec![Line::from(Span::styled(
                "No bar selected",
                Style::default().fg(Color::Gray),
            ))],
            |s| {
                vec![
                    Line::from(format!("Successes: {}", s.successes)),
                    Line::from(format!("Frequency: {}", s.frequency)),
                    Line::from(format!("z-score:   {:.3}", s.z_score)),
                    Line::from(format!("p-value:   {:.4}", s.p_value)),
                ]
            },
        );

        let panel = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Selected bar")
                .border_style(Style::default().fg(Color::Magenta)),
        );
        f.render_widget(panel, area);
    }

    fn render_status_bar(f: &mut Frame, area: Rect, app: &SimulatorApp) {
        let mut spans = vec![
            Span::styled(" Space", Style::default().fg(Color::Yellow)),
            Span::raw(" start/stop  "),
            Span::styled("r", Style::default().fg(Color::Yellow)),
            Span::raw(" reset  "),
            Span::styled("+/-", Style::default().fg(Color::Yellow)),
            Span::raw(" speed  "),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::raw(" clear  "),
            Span::styled("q", Style::default().fg(Color::Yellow)),
            Span::raw(" quit  │ "),
            Span::raw(app.status.as_str()),
        ];
        if let Some(err) = app.sim.last_error() {
            spans.push(Span::styled(
                format!("  {err}"),
                Style::default().fg(Color::Red),
            ));
        }

        let bar = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
        f.render_widget(bar, area);
    }
}
