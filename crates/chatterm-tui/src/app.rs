//! Main application state and render loop.
//!
//! `App::handle_action` is the state machine: it folds every key press,
//! resize, tick and completion result into the session and the components,
//! and returns the side effect (if any) for the loop to perform. `App::run`
//! owns the terminal and the channels and never touches session state
//! except through `handle_action`.

use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::layout::{Constraint, Layout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

use chatterm_core::{ChatConfig, Session, SessionState, Submission};
use chatterm_gateway::{response_channel, CompletionGateway};

use crate::action::{Action, Effect};
use crate::components::input_box::InputBoxComponent;
use crate::components::spinner::SpinnerComponent;
use crate::components::status_bar::StatusBarComponent;
use crate::components::transcript_view::TranscriptViewComponent;
use crate::components::Component;
use crate::event::EventHandler;
use crate::terminal::{self, Tui};

/// Rows taken by everything except the transcript and the input text:
/// spinner line, input border (2) and key hint line.
const CHROME_ROWS: u16 = 4;

/// Main application state.
pub struct App {
    /// Whether the app should exit.
    should_quit: bool,
    /// Whether the alternate screen is active.
    alt_screen: bool,
    tick_rate: Duration,

    /// Transcript and the one-request-at-a-time guard.
    session: Session,
    /// Shared with the background completion task.
    gateway: Arc<CompletionGateway>,

    // Components
    transcript_view: TranscriptViewComponent,
    input_box: InputBoxComponent,
    spinner: SpinnerComponent,
    status_bar: StatusBarComponent,
}

impl App {
    pub fn new(config: &ChatConfig, gateway: Arc<CompletionGateway>) -> Self {
        let session = Session::new(&config.display)
            .with_system_prompt(config.chat.system_prompt.as_deref());
        let mut transcript_view = TranscriptViewComponent::new();
        transcript_view.set_transcript(session.transcript());

        Self {
            should_quit: false,
            alt_screen: true,
            tick_rate: Duration::from_millis(config.display.tick_rate_ms.max(10)),
            status_bar: StatusBarComponent::new(gateway.model().to_string()),
            session,
            gateway,
            transcript_view,
            input_box: InputBoxComponent::new(
                config.display.input_char_limit,
                config.display.input_height,
            ),
            spinner: SpinnerComponent::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn input(&self) -> &str {
        self.input_box.value()
    }

    pub fn scroll_position(&self) -> u16 {
        self.transcript_view.scroll()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Run the TUI until the user quits. Returns the unsent input.
    pub async fn run(&mut self) -> anyhow::Result<String> {
        let (mut terminal, guard) = terminal::init()?;

        let result = self.event_loop(&mut terminal).await;

        // Restore terminal, even if the loop failed.
        guard.release()?;

        result?;
        Ok(self.input_box.value().to_string())
    }

    async fn event_loop(&mut self, terminal: &mut Tui) -> anyhow::Result<()> {
        // Create the action channel.
        let (tx, mut rx) = mpsc::unbounded_channel::<Action>();

        let event_handler = EventHandler::new(tx.clone(), self.tick_rate);
        tokio::spawn(async move {
            event_handler.run().await;
        });

        let (response_tx, mut response_rx) = response_channel();

        // Crossterm only reports changes, so seed the first size ourselves.
        let size = terminal.size()?;
        let _ = tx.send(Action::Resize(size.width, size.height));

        info!("Entering render loop");
        loop {
            terminal.draw(|frame| {
                self.render(frame);
            })?;

            let action = tokio::select! {
                Some(action) = rx.recv() => action,
                Some(result) = response_rx.recv() => Action::CompletionDelivered(result),
                else => break,
            };

            if let Some(effect) = self.handle_action(action) {
                match effect {
                    Effect::Dispatch(request) => {
                        self.gateway.submit(request, response_tx.clone());
                    }
                    Effect::AltScreen(true) => {
                        execute!(terminal.backend_mut(), EnterAlternateScreen)?;
                        terminal.clear()?;
                    }
                    Effect::AltScreen(false) => {
                        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
                        terminal.clear()?;
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        info!("Leaving render loop");
        Ok(())
    }

    /// Apply one action to the state machine.
    pub fn handle_action(&mut self, action: Action) -> Option<Effect> {
        match action {
            Action::Quit => {
                self.should_quit = true;
                None
            }
            Action::ToggleAltScreen => {
                self.alt_screen = !self.alt_screen;
                Some(Effect::AltScreen(self.alt_screen))
            }
            Action::Resize(width, height) => {
                let viewport_height =
                    height.saturating_sub(self.input_box.height() + CHROME_ROWS);
                self.transcript_view.resize(width, viewport_height);
                None
            }
            Action::Tick => {
                if self.session.is_pending() {
                    self.spinner.tick();
                }
                None
            }
            Action::Submit => self.submit(),
            Action::CompletionDelivered(result) => {
                if self.session.deliver(result) {
                    self.input_box.clear();
                    self.refresh_transcript();
                    self.spinner.stop();
                    self.status_bar.waiting = false;
                }
                None
            }
            other => {
                self.input_box.handle_action(&other);
                self.transcript_view.handle_action(&other);
                None
            }
        }
    }

    fn submit(&mut self) -> Option<Effect> {
        match self.session.submit(self.input_box.value()) {
            Submission::Dispatch(request) => {
                self.input_box.clear();
                self.refresh_transcript();
                self.spinner.start();
                self.status_bar.waiting = true;
                Some(Effect::Dispatch(request))
            }
            Submission::Empty => None,
            Submission::Busy => {
                debug!("Submit while awaiting a reply; input kept");
                None
            }
        }
    }

    fn refresh_transcript(&mut self) {
        self.transcript_view.set_transcript(self.session.transcript());
        self.transcript_view.scroll_to_bottom();
    }

    /// Render the full UI.
    pub fn render(&self, frame: &mut ratatui::Frame) {
        let area = frame.area();

        let chunks = Layout::vertical([
            Constraint::Min(1),                                 // Transcript
            Constraint::Length(1),                              // Spinner
            Constraint::Length(self.input_box.height() + 2),    // Input box
            Constraint::Length(1),                              // Key hints
        ])
        .split(area);

        self.transcript_view.render(frame, chunks[0]);
        self.spinner.render(frame, chunks[1]);
        self.input_box.render(frame, chunks[2]);
        self.status_bar.render(frame, chunks[3]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatterm_core::{CompletionResult, ConversationRequest, Entry, Message};
    use chatterm_gateway::GatewayConfig;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn app() -> App {
        app_with(ChatConfig::default())
    }

    fn app_with(config: ChatConfig) -> App {
        let gateway = CompletionGateway::new(GatewayConfig {
            base_url: "http://127.0.0.1:9/v1".to_string(),
            model: config.api.model.clone(),
            api_key: "sk-test".to_string(),
            timeout: None,
        })
        .unwrap();
        App::new(&config, Arc::new(gateway))
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            assert_eq!(app.handle_action(Action::CharInput(c)), None);
        }
    }

    #[test]
    fn hello_scenario() {
        let mut app = app();
        app.handle_action(Action::Resize(80, 24));
        type_str(&mut app, "Hello");

        let effect = app.handle_action(Action::Submit);
        assert_eq!(
            effect,
            Some(Effect::Dispatch(ConversationRequest {
                messages: vec![Message::user("Hello")]
            }))
        );
        assert_eq!(app.state(), SessionState::Awaiting);
        assert_eq!(app.input(), "");

        app.handle_action(Action::CompletionDelivered(CompletionResult::Reply(
            Message::assistant("Hi there!"),
        )));
        assert_eq!(app.state(), SessionState::Idle);
        assert_eq!(
            app.session().transcript().conversation(),
            vec![Message::user("Hello"), Message::assistant("Hi there!")]
        );
    }

    #[test]
    fn blank_submit_does_nothing() {
        let mut app = app();
        type_str(&mut app, "   ");
        assert_eq!(app.handle_action(Action::Submit), None);
        assert!(app.session().transcript().is_empty());
        assert_eq!(app.state(), SessionState::Idle);
    }

    #[test]
    fn only_one_dispatch_while_pending() {
        let mut app = app();
        let mut dispatches = 0;

        type_str(&mut app, "first");
        if let Some(Effect::Dispatch(_)) = app.handle_action(Action::Submit) {
            dispatches += 1;
        }
        type_str(&mut app, "second");
        for _ in 0..3 {
            if let Some(Effect::Dispatch(_)) = app.handle_action(Action::Submit) {
                dispatches += 1;
            }
        }

        assert_eq!(dispatches, 1);
        assert!(app.session().is_pending());
        // The widget stays live: the text typed while waiting is still there.
        assert_eq!(app.input(), "second");
        assert_eq!(app.session().transcript().len(), 1);
    }

    #[test]
    fn provider_error_is_one_entry_and_unblocks() {
        let mut app = app();
        type_str(&mut app, "Hello");
        app.handle_action(Action::Submit);
        let before = app.session().transcript().len();

        app.handle_action(Action::CompletionDelivered(CompletionResult::Failed(
            "API error 401 Unauthorized: bad key".to_string(),
        )));

        assert_eq!(app.session().transcript().len(), before + 1);
        assert!(matches!(
            app.session().transcript().entries().last(),
            Some(Entry::Error(_))
        ));
        assert_eq!(app.state(), SessionState::Idle);

        type_str(&mut app, "again");
        assert!(matches!(
            app.handle_action(Action::Submit),
            Some(Effect::Dispatch(_))
        ));
    }

    #[test]
    fn long_reply_is_wrapped_before_display() {
        let mut app = app();
        type_str(&mut app, "go");
        app.handle_action(Action::Submit);

        let content = "lorem ipsum ".repeat(25).trim_end().to_string();
        assert_eq!(content.len(), 299);
        app.handle_action(Action::CompletionDelivered(CompletionResult::Reply(
            Message::assistant(content.clone()),
        )));

        let conversation = app.session().transcript().conversation();
        assert_eq!(
            conversation[1].content,
            chatterm_core::wrap::wrap(&content, 120).join("\n")
        );
    }

    #[test]
    fn spinner_ticks_only_while_awaiting() {
        let mut app = app();
        app.handle_action(Action::Tick);
        assert!(!app.spinner.is_active());
        assert_eq!(app.spinner.frame(), 0);

        type_str(&mut app, "Hello");
        app.handle_action(Action::Submit);
        app.handle_action(Action::Tick);
        assert!(app.spinner.is_active());
        assert_eq!(app.spinner.frame(), 1);
        assert_eq!(app.state(), SessionState::Awaiting);

        app.handle_action(Action::CompletionDelivered(CompletionResult::Reply(
            Message::assistant("done"),
        )));
        assert!(!app.spinner.is_active());
    }

    #[test]
    fn resize_initializes_viewport_once_and_keeps_state() {
        let mut app = app();
        assert!(app.transcript_view.viewport().is_none());

        type_str(&mut app, "Hello");
        app.handle_action(Action::Submit);
        app.handle_action(Action::Resize(100, 30));
        let viewport = app.transcript_view.viewport().unwrap();
        assert_eq!(viewport.width, 100);
        assert_eq!(viewport.height, 30 - 3 - CHROME_ROWS);

        app.handle_action(Action::Resize(60, 20));
        assert_eq!(app.transcript_view.viewport().unwrap().height, 20 - 3 - CHROME_ROWS);
        assert_eq!(app.state(), SessionState::Awaiting);
    }

    #[test]
    fn replies_scroll_to_bottom() {
        let mut app = app();
        app.handle_action(Action::Resize(40, 3 + CHROME_ROWS + 2));
        for i in 0..4 {
            type_str(&mut app, &format!("q{i}"));
            app.handle_action(Action::Submit);
            app.handle_action(Action::CompletionDelivered(CompletionResult::Reply(
                Message::assistant(format!("a{i}")),
            )));
        }
        // 8 one-row entries in a 2-row viewport.
        assert_eq!(app.scroll_position(), 6);

        app.handle_action(Action::ScrollUp);
        assert_eq!(app.scroll_position(), 5);
    }

    #[test]
    fn quit_keeps_unsent_input() {
        let mut app = app();
        type_str(&mut app, "draft");
        assert_eq!(app.handle_action(Action::Quit), None);
        assert!(app.should_quit());
        assert_eq!(app.input(), "draft");
    }

    #[test]
    fn alt_screen_toggles() {
        let mut app = app();
        assert_eq!(
            app.handle_action(Action::ToggleAltScreen),
            Some(Effect::AltScreen(false))
        );
        assert_eq!(
            app.handle_action(Action::ToggleAltScreen),
            Some(Effect::AltScreen(true))
        );
    }

    #[test]
    fn system_prompt_is_shown_and_sent() {
        let mut config = ChatConfig::default();
        config.chat.system_prompt = Some("You are terse.".to_string());
        let mut app = app_with(config);

        type_str(&mut app, "Hi");
        let Some(Effect::Dispatch(request)) = app.handle_action(Action::Submit) else {
            panic!("expected a dispatch");
        };
        assert_eq!(request.messages[0], Message::system("You are terse."));
    }

    #[test]
    fn renders_transcript_spinner_and_input() {
        let mut app = app();
        let mut terminal = Terminal::new(TestBackend::new(60, 14)).unwrap();
        app.handle_action(Action::Resize(60, 14));

        let screen = |terminal: &Terminal<TestBackend>| -> String {
            terminal
                .backend()
                .buffer()
                .content()
                .iter()
                .map(|cell| cell.symbol())
                .collect()
        };

        terminal.draw(|frame| app.render(frame)).unwrap();
        assert!(screen(&terminal).contains("Welcome to the chat room!"));

        type_str(&mut app, "Hello");
        app.handle_action(Action::Submit);
        terminal.draw(|frame| app.render(frame)).unwrap();
        let text = screen(&terminal);
        assert!(text.contains("You: Hello"));
        assert!(text.contains("Thinking..."));
        assert!(text.contains("Send a message..."));

        app.handle_action(Action::CompletionDelivered(CompletionResult::Failed(
            "request timed out".to_string(),
        )));
        terminal.draw(|frame| app.render(frame)).unwrap();
        let text = screen(&terminal);
        assert!(text.contains("Error: request timed out"));
        assert!(!text.contains("Thinking..."));
    }
}
