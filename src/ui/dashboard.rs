// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Dessine l'interface TUI en utilisant les widgets de ratatui
//
// CONCEPTS RATATUI :
// 1. Frame : surface de dessin
// 2. Widgets : composants UI (Block, Paragraph, etc.)
// 3. Layout : découpage de l'espace en zones
// 4. Style : couleurs et attributs de texte
//
// Le rendu ne fait que lire App : aucune modification d'état ici.
// ============================================================================

use chrono::Datelike;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, ConnectionStatus};
use crate::models::{BalanceView, MetadataStatus};

/// Dessine l'interface complète
///
/// # Arguments
/// * `frame` - Surface de dessin ratatui
/// * `app` - État de l'application
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_header(frame, chunks[0]);
    render_token_panel(frame, app, chunks[1]);
    render_wallet_panel(frame, app, chunks[2]);
    render_actions(frame, app, chunks[3]);
    render_action_info(frame, app, chunks[4]);
    render_footer(frame, app, chunks[5]);
}

// ============================================================================
// Layout : Découpage de l'écran
// ============================================================================

/// Crée le layout principal
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(6), // Token
            Constraint::Length(6), // Wallet
            Constraint::Length(3), // Actions
            Constraint::Min(3),    // Ligne d'information
            Constraint::Length(4), // Footer
        ])
        .split(area)
        .to_vec()
}

fn label_style() -> Style {
    Style::default().fg(Color::Gray)
}

fn value_style() -> Style {
    Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
}

/// Ligne "Label: valeur"
fn field<'a>(label: &'a str, value: String, style: Style) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{:<10}", label), label_style()),
        Span::styled(value, style),
    ])
}

// ============================================================================
// Header
// ============================================================================

fn render_header(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" ZartWallet ")
        .title_alignment(Alignment::Center);

    let text = vec![Line::from(Span::styled(
        "ZART Token on Sepolia",
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
    ))];

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Panneau token
// ============================================================================
// Affiché dès le démarrage, indépendamment du wallet
// ============================================================================

fn render_token_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Token ");

    let (name, name_style) = match &app.metadata {
        MetadataStatus::Loading => ("Loading...".to_string(), label_style()),
        MetadataStatus::Ready(token) => (token.display_name(), value_style()),
        MetadataStatus::Failed => ("Error".to_string(), Style::default().fg(Color::Red)),
    };

    let decimals_style = match app.metadata {
        MetadataStatus::Failed => Style::default().fg(Color::Red),
        _ => value_style(),
    };

    let text = vec![
        field("Name", name, name_style),
        field("Address", app.token_address.to_string(), value_style()),
        field("Decimals", app.metadata.decimals_label(), decimals_style),
        field(
            "Explorer",
            app.explorer_link.clone(),
            Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
        ),
    ];

    frame.render_widget(Paragraph::new(text).block(block), area);
}

// ============================================================================
// Panneau wallet
// ============================================================================

fn render_wallet_panel(frame: &mut Frame, app: &App, area: Rect) {
    let title = match &app.session {
        Some(session) => format!(" Wallet ({}) ", session.short_account()),
        None => " Wallet ".to_string(),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    let status_style = match app.connection {
        ConnectionStatus::Connected => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ConnectionStatus::Connecting => Style::default().fg(Color::Yellow),
        ConnectionStatus::Failed | ConnectionStatus::NoProvider => Style::default().fg(Color::Red),
        ConnectionStatus::Disconnected => label_style(),
    };

    let (network, network_style) = match app.wallet_chain {
        Some(chain) if chain == app.expected_chain => (format!("{} (expected)", chain), value_style()),
        Some(chain) => (format!("{} (wrong network)", chain), Style::default().fg(Color::Red)),
        None => ("N/A".to_string(), label_style()),
    };

    let balance = app.balance_view();
    let (balance_text, balance_style) = match &balance {
        BalanceView::Ready(_) => {
            let symbol = app
                .metadata
                .descriptor()
                .and_then(|token| token.symbol.clone())
                .unwrap_or_else(|| "ZART".to_string());
            (
                format!("{} {}", balance.label(), symbol),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )
        }
        BalanceView::WrongNetwork | BalanceView::Error => {
            (balance.label(), Style::default().fg(Color::Red))
        }
        BalanceView::Loading | BalanceView::Unavailable => (balance.label(), label_style()),
    };

    let text = vec![
        field("Status", app.connection.label().to_string(), status_style),
        field("Network", network, network_style),
        field("Account", app.account_label(), value_style()),
        field("Balance", balance_text, balance_style),
    ];

    frame.render_widget(Paragraph::new(text).block(block), area);
}

// ============================================================================
// Actions
// ============================================================================
// CONCEPT : Boutons désactivés = libellé grisé
// ============================================================================

fn button<'a>(key: &'a str, label: &'a str, enabled: bool) -> Vec<Span<'a>> {
    let (key_style, label_style) = if enabled {
        (
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            Style::default().fg(Color::White),
        )
    } else {
        (
            Style::default().fg(Color::DarkGray),
            Style::default().fg(Color::DarkGray),
        )
    };

    vec![
        Span::styled(key, key_style),
        Span::styled(format!(" {}   ", label), label_style),
    ]
}

fn render_actions(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Actions ");

    let actions_enabled = app.actions_enabled();

    let mut spans = button("[c]", app.connect_label(), app.connect_enabled());
    spans.extend(button("[b]", "Buy/Sell ZART", actions_enabled));
    spans.extend(button("[f]", "Faucet", actions_enabled));
    spans.extend(button("[r]", "Refresh", actions_enabled));

    let paragraph = Paragraph::new(Line::from(spans))
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

fn render_action_info(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Info ");

    let text = match &app.action_info {
        Some(info) => Line::from(Span::styled(info.clone(), Style::default().fg(Color::Yellow))),
        None => Line::from(""),
    };

    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Footer : Instructions
// ============================================================================

/// Dessine le footer avec les raccourcis clavier
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let shortcuts = if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled(
                "⚠  Appuyez sur ",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        Line::from(vec![
            Span::styled("[q]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" Quit  "),
            Span::styled("[c]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" Connect/Disconnect  "),
            Span::styled("[r]", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::raw(" Refresh  "),
            Span::styled("[b]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(" Buy/Sell  "),
            Span::styled("[f]", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(" Faucet"),
        ])
    };

    let copyright = Line::from(Span::styled(
        format!("© {} ZartWallet", chrono::Local::now().year()),
        Style::default().fg(Color::DarkGray),
    ));

    let paragraph = Paragraph::new(vec![shortcuts, copyright])
        .block(block)
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Tests unitaires
// ============================================================================
