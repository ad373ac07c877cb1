use std::{io, ops::Range, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use staybook_core::{
    listing::{PRICE_RANGES, ROOM_TYPES},
    notice::{Notice, NoticeLevel},
    ActionError, AppContext, Booking, BookingRequest, DashboardSummary, HotelRegistration,
    RoomQuery, RoomRecord, SignupForm,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::form::{Form, FormAction};

const TICK_RATE: Duration = Duration::from_millis(250);
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone)]
struct Theme {
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Rooms,
    Login,
    Signup,
    Booking,
    MyBookings,
    Dashboard,
    OwnerRooms,
    RegisterHotel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterKind {
    RoomType,
    PriceRange,
}

impl FilterKind {
    fn title(self) -> &'static str {
        match self {
            FilterKind::RoomType => "Room type",
            FilterKind::PriceRange => "Price range",
        }
    }

    fn len(self) -> usize {
        match self {
            FilterKind::RoomType => ROOM_TYPES.len(),
            FilterKind::PriceRange => PRICE_RANGES.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Search,
    Picker(FilterKind),
}

enum AppEvent {
    Input(Event),
    Tick,
}

/// Terminal storefront over an [`AppContext`].
pub struct StorefrontApp {
    context: AppContext,
    notices: Option<mpsc::UnboundedReceiver<Notice>>,
    query: RoomQuery,
    search: String,
    visible: Vec<RoomRecord>,
    screen: Screen,
    mode: Mode,
    form: Option<Form>,
    selected_room: Option<RoomRecord>,
    availability_confirmed: bool,
    bookings: Vec<Booking>,
    payment: Option<(String, String)>,
    dashboard: Option<DashboardSummary>,
    owner_rooms: Vec<RoomRecord>,
    return_to: Option<Screen>,
    state: UiState,
    theme: Theme,
}

impl StorefrontApp {
    pub fn new(context: AppContext, notices: mpsc::UnboundedReceiver<Notice>) -> Self {
        Self {
            context,
            notices: Some(notices),
            query: RoomQuery::default(),
            search: String::new(),
            visible: Vec::new(),
            screen: Screen::Rooms,
            mode: Mode::Browse,
            form: None,
            selected_room: None,
            availability_confirmed: false,
            bookings: Vec::new(),
            payment: None,
            dashboard: None,
            owner_rooms: Vec::new(),
            return_to: None,
            state: UiState::default(),
            theme: Theme::default(),
        }
    }

    /// Hand the context back for teardown.
    pub fn into_context(self) -> AppContext {
        self.context
    }

    pub async fn run(&mut self) -> Result<()> {
        self.refresh_visible();
        self.state.set_status(
            NoticeLevel::Info,
            format!("Loaded {} rooms", self.context.rooms().len()),
        );

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        let mut notices = self.notices.take();

        loop {
            if let Some(rx) = notices.as_mut() {
                while let Ok(notice) = rx.try_recv() {
                    self.show_notice(notice);
                }
            }
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            if let Some(rx) = notices.as_mut() {
                let mut notices_closed = false;
                tokio::select! {
                    maybe_event = event_rx.recv() => {
                        if !self.process_app_event(maybe_event).await {
                            break;
                        }
                    }
                    maybe_notice = rx.recv() => {
                        match maybe_notice {
                            Some(notice) => self.show_notice(notice),
                            None => notices_closed = true,
                        }
                    }
                }
                if notices_closed {
                    notices = None;
                }
            } else {
                let maybe_event = event_rx.recv().await;
                if !self.process_app_event(maybe_event).await {
                    break;
                }
            }
        }

        restore_terminal(&mut terminal)?;
        Ok(())
    }

    fn show_notice(&mut self, notice: Notice) {
        debug!(level = ?notice.level, message = %notice.message, "notice");
        self.state.set_status(notice.level, notice.message);
    }

    fn refresh_visible(&mut self) {
        self.visible = self.context.visible_rooms(&self.query);
        self.state.rooms.clamp(self.visible.len());
    }

    fn current_room(&self) -> Option<&RoomRecord> {
        self.visible.get(self.state.rooms.cursor)
    }

    async fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                if let Err(err) = self.handle_input(event).await {
                    self.state
                        .set_status(NoticeLevel::Error, format!("Error: {err}"));
                }
                true
            }
            Some(AppEvent::Tick) => true,
            None => false,
        }
    }

    async fn handle_input(&mut self, event: Event) -> Result<()> {
        let Event::Key(key) = event else {
            return Ok(());
        };
        if key.kind == KeyEventKind::Release {
            return Ok(());
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.state.should_quit = true;
            return Ok(());
        }
        if self.form.is_some() {
            return self.handle_form_key(key).await;
        }
        match self.screen {
            Screen::Rooms => self.handle_rooms_key(key).await,
            Screen::MyBookings => self.handle_bookings_key(key).await,
            Screen::Dashboard => self.handle_dashboard_key(key).await,
            Screen::OwnerRooms => self.handle_owner_rooms_key(key).await,
            Screen::Login | Screen::Signup | Screen::Booking | Screen::RegisterHotel => {
                self.screen = Screen::Rooms;
                Ok(())
            }
        }
    }

    async fn open(&mut self, screen: Screen) -> Result<()> {
        match screen {
            Screen::Rooms => {
                self.form = None;
                self.screen = Screen::Rooms;
            }
            Screen::Login => self.open_login(None),
            Screen::Signup => {
                self.form = Some(Form::new(
                    "Create account",
                    &[("Username", false), ("Email", false), ("Password", true)],
                ));
                self.screen = Screen::Signup;
            }
            Screen::Booking => {
                let Some(room) = self.current_room().cloned() else {
                    self.state
                        .set_status(NoticeLevel::Info, "No room selected".to_string());
                    return Ok(());
                };
                let today = Local::now().date_naive();
                let tomorrow = today.succ_opt().unwrap_or(today);
                self.form = Some(
                    Form::new(
                        "Book this room",
                        &[("Check-in", false), ("Check-out", false), ("Guests", false)],
                    )
                    .with_value(0, today.format(DATE_FORMAT).to_string())
                    .with_value(1, tomorrow.format(DATE_FORMAT).to_string())
                    .with_value(2, "1"),
                );
                info!(room = %room.id, "opening booking form");
                self.selected_room = Some(room);
                self.availability_confirmed = false;
                self.screen = Screen::Booking;
            }
            Screen::MyBookings => match self.context.my_bookings().await {
                Ok(bookings) => {
                    self.bookings = bookings;
                    self.state.bookings.reset();
                    self.screen = Screen::MyBookings;
                }
                Err(err) => self.redirect_if_signed_out(&err, screen),
            },
            Screen::Dashboard => match self.context.dashboard().await {
                Ok(summary) => {
                    self.dashboard = Some(summary);
                    self.state.dashboard.reset();
                    self.screen = Screen::Dashboard;
                }
                Err(err) => self.redirect_if_signed_out(&err, screen),
            },
            Screen::OwnerRooms => match self.context.owner_rooms().await {
                Ok(rooms) => {
                    self.owner_rooms = rooms;
                    self.state.owner_rooms.clamp(self.owner_rooms.len());
                    self.screen = Screen::OwnerRooms;
                }
                Err(err) => self.redirect_if_signed_out(&err, screen),
            },
            Screen::RegisterHotel => {
                if !self.context.session().is_authenticated() {
                    self.context
                        .notifier()
                        .error(ActionError::NotAuthenticated.to_string());
                    self.open_login(Some(Screen::RegisterHotel));
                    return Ok(());
                }
                self.form = Some(Form::new(
                    "Register your hotel",
                    &[
                        ("Hotel name", false),
                        ("Phone", false),
                        ("Address", false),
                        ("City", false),
                    ],
                ));
                self.screen = Screen::RegisterHotel;
            }
        }
        Ok(())
    }

    fn open_login(&mut self, return_to: Option<Screen>) {
        let email = self
            .context
            .session()
            .user()
            .map(|user| user.email.clone())
            .unwrap_or_default();
        self.form = Some(
            Form::new("Log in", &[("Email", false), ("Password", true)]).with_value(0, email),
        );
        self.return_to = return_to;
        self.screen = Screen::Login;
    }

    fn redirect_if_signed_out(&mut self, err: &ActionError, target: Screen) {
        if matches!(err, ActionError::NotAuthenticated) || err.is_unauthorized() {
            self.open_login(Some(target));
        }
    }

    async fn handle_form_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(form) = self.form.as_mut() else {
            return Ok(());
        };
        match form.handle_key(key) {
            FormAction::Cancel => {
                self.form = None;
                self.return_to = None;
                self.screen = Screen::Rooms;
                self.state
                    .set_status(NoticeLevel::Info, "Cancelled".to_string());
            }
            FormAction::Edited => {
                if self.screen == Screen::Booking {
                    self.availability_confirmed = false;
                }
            }
            FormAction::Submit => self.submit_form().await?,
            FormAction::None => {}
        }
        Ok(())
    }

    async fn submit_form(&mut self) -> Result<()> {
        let Some(form) = self.form.clone() else {
            return Ok(());
        };
        match self.screen {
            Screen::Login => {
                let result = self
                    .context
                    .session_mut()
                    .login(form.value(0), form.value(1))
                    .await;
                if result.is_ok() {
                    self.form = None;
                    let target = self.return_to.take().unwrap_or(Screen::Rooms);
                    self.open(target).await?;
                }
            }
            Screen::Signup => {
                let signup = SignupForm {
                    username: form.value(0).trim().to_string(),
                    email: form.value(1).trim().to_string(),
                    password: form.value(2).to_string(),
                };
                if self.context.session().signup(&signup).await.is_ok() {
                    self.open_login(None);
                    if let Some(login) = self.form.take() {
                        self.form = Some(login.with_value(0, signup.email));
                    }
                }
            }
            Screen::Booking => self.submit_booking(&form).await,
            Screen::RegisterHotel => {
                let registration = HotelRegistration {
                    name: form.value(0).trim().to_string(),
                    contact: form.value(1).trim().to_string(),
                    address: form.value(2).trim().to_string(),
                    city: form.value(3).trim().to_string(),
                    latitude: None,
                    longitude: None,
                };
                if self.context.register_hotel(&registration).await.is_ok() {
                    self.form = None;
                    self.open(Screen::Dashboard).await?;
                }
            }
            Screen::Rooms | Screen::MyBookings | Screen::Dashboard | Screen::OwnerRooms => {
                self.form = None;
            }
        }
        Ok(())
    }

    /// First submit checks availability; a second one books.
    async fn submit_booking(&mut self, form: &Form) {
        let Some(room) = self.selected_room.as_ref() else {
            return;
        };
        let request = match parse_booking(&room.id, form) {
            Ok(request) => request,
            Err(err) => {
                self.context.notifier().error(err.to_string());
                return;
            }
        };

        if !self.availability_confirmed {
            if let Ok(available) = self.context.check_availability(&request).await {
                self.availability_confirmed = available;
            }
            return;
        }

        match self.context.book(&request).await {
            Ok(()) => {
                self.form = None;
                self.availability_confirmed = false;
                if let Err(err) = self.open(Screen::MyBookings).await {
                    self.state
                        .set_status(NoticeLevel::Error, format!("Error: {err}"));
                }
            }
            Err(err) => {
                if matches!(err, ActionError::NotAuthenticated) || err.is_unauthorized() {
                    self.availability_confirmed = false;
                }
            }
        }
    }

    async fn handle_rooms_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.mode {
            Mode::Search => {
                self.handle_search_key(key);
                return Ok(());
            }
            Mode::Picker(kind) => {
                self.handle_picker_key(kind, key);
                return Ok(());
            }
            Mode::Browse => {}
        }

        let len = self.visible.len();
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.state.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.state.rooms.move_by(1, len),
            KeyCode::Char('k') | KeyCode::Up => self.state.rooms.move_by(-1, len),
            KeyCode::Char('g') | KeyCode::Home => self.state.rooms.move_to(0, len),
            KeyCode::Char('G') | KeyCode::End => self.state.rooms.move_to(usize::MAX, len),
            KeyCode::PageDown => self.state.rooms.page(true, len),
            KeyCode::PageUp => self.state.rooms.page(false, len),
            KeyCode::Char('/') => {
                self.mode = Mode::Search;
                self.state
                    .set_status(NoticeLevel::Info, "Type a destination".to_string());
            }
            KeyCode::Char('t') => self.open_picker(FilterKind::RoomType),
            KeyCode::Char('p') => self.open_picker(FilterKind::PriceRange),
            KeyCode::Char('s') => {
                let next = self.query.sort.next();
                self.query.set_sort(next);
                self.refresh_visible();
                let label = next.label().unwrap_or("Unsorted");
                self.state
                    .set_status(NoticeLevel::Info, format!("Sort: {label}"));
            }
            KeyCode::Char('c') => {
                self.query.clear();
                self.search.clear();
                self.refresh_visible();
                self.state
                    .set_status(NoticeLevel::Info, "Filters cleared".to_string());
            }
            KeyCode::Char('r') => {
                if self.context.load_rooms().await {
                    self.refresh_visible();
                    self.state.set_status(
                        NoticeLevel::Info,
                        format!("Loaded {} rooms", self.context.rooms().len()),
                    );
                }
            }
            KeyCode::Enter => self.open(Screen::Booking).await?,
            KeyCode::Char('l') => {
                if self.context.session().token().is_some() {
                    self.context.session_mut().logout();
                } else {
                    self.open_login(None);
                }
            }
            KeyCode::Char('u') => self.open(Screen::Signup).await?,
            KeyCode::Char('b') => self.open(Screen::MyBookings).await?,
            KeyCode::Char('d') => self.open(Screen::Dashboard).await?,
            KeyCode::Char('o') => self.open(Screen::OwnerRooms).await?,
            KeyCode::Char('h') => self.open(Screen::RegisterHotel).await?,
            _ => {}
        }
        Ok(())
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.mode = Mode::Browse;
                let message = if self.search.trim().is_empty() {
                    "Showing all destinations".to_string()
                } else {
                    format!("Destination: {}", self.search)
                };
                self.state.set_status(NoticeLevel::Info, message);
                return;
            }
            KeyCode::Backspace => {
                self.search.pop();
            }
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                self.search.push(ch);
            }
            _ => return,
        }
        self.query.set_destination(self.search.clone());
        self.state.rooms.reset();
        self.refresh_visible();
    }

    fn open_picker(&mut self, kind: FilterKind) {
        self.mode = Mode::Picker(kind);
        self.state.picker = 0;
    }

    fn handle_picker_key(&mut self, kind: FilterKind, key: KeyEvent) {
        let len = kind.len();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.mode = Mode::Browse,
            KeyCode::Char('j') | KeyCode::Down => {
                self.state.picker = (self.state.picker + 1).min(len.saturating_sub(1));
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.state.picker = self.state.picker.saturating_sub(1);
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                let index = self.state.picker;
                let (label, selected) = match kind {
                    FilterKind::RoomType => {
                        let room_type = ROOM_TYPES[index];
                        (room_type.to_string(), self.query.toggle_room_type(room_type))
                    }
                    FilterKind::PriceRange => {
                        let range = PRICE_RANGES[index];
                        (range.to_string(), self.query.toggle_price_range(range))
                    }
                };
                self.state.rooms.reset();
                self.refresh_visible();
                let verb = if selected { "Added" } else { "Removed" };
                self.state.set_status(
                    NoticeLevel::Info,
                    format!("{verb} filter {label} ({} rooms)", self.visible.len()),
                );
            }
            _ => {}
        }
    }

    async fn handle_bookings_key(&mut self, key: KeyEvent) -> Result<()> {
        let len = self.bookings.len();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.screen = Screen::Rooms,
            KeyCode::Char('j') | KeyCode::Down => self.state.bookings.move_by(1, len),
            KeyCode::Char('k') | KeyCode::Up => self.state.bookings.move_by(-1, len),
            KeyCode::Char('r') => self.open(Screen::MyBookings).await?,
            KeyCode::Char('p') | KeyCode::Enter => {
                let Some(booking) = self.bookings.get(self.state.bookings.cursor) else {
                    return Ok(());
                };
                if booking.is_paid {
                    self.state
                        .set_status(NoticeLevel::Info, "Booking already paid".to_string());
                    return Ok(());
                }
                let booking_id = booking.id.clone();
                match self.context.payment_link(&booking_id).await {
                    Ok(url) => {
                        info!(booking = %booking_id, "payment link issued");
                        self.state.set_status(
                            NoticeLevel::Success,
                            format!("Complete payment at {url}"),
                        );
                        self.payment = Some((booking_id, url));
                    }
                    Err(err) => self.redirect_if_signed_out(&err, Screen::MyBookings),
                }
            }
            _ => {}
        }
        Ok(())
    }

    async fn handle_dashboard_key(&mut self, key: KeyEvent) -> Result<()> {
        let len = self
            .dashboard
            .as_ref()
            .map(|summary| summary.bookings.len())
            .unwrap_or(0);
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.screen = Screen::Rooms,
            KeyCode::Char('j') | KeyCode::Down => self.state.dashboard.move_by(1, len),
            KeyCode::Char('k') | KeyCode::Up => self.state.dashboard.move_by(-1, len),
            KeyCode::Char('r') => self.open(Screen::Dashboard).await?,
            KeyCode::Char('o') => self.open(Screen::OwnerRooms).await?,
            _ => {}
        }
        Ok(())
    }

    async fn handle_owner_rooms_key(&mut self, key: KeyEvent) -> Result<()> {
        let len = self.owner_rooms.len();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.screen = Screen::Rooms,
            KeyCode::Char('j') | KeyCode::Down => self.state.owner_rooms.move_by(1, len),
            KeyCode::Char('k') | KeyCode::Up => self.state.owner_rooms.move_by(-1, len),
            KeyCode::Char('d') => self.open(Screen::Dashboard).await?,
            KeyCode::Char(' ') | KeyCode::Enter => {
                let Some(room_id) = self
                    .owner_rooms
                    .get(self.state.owner_rooms.cursor)
                    .map(|room| room.id.clone())
                else {
                    return Ok(());
                };
                match self.context.toggle_room_availability(&room_id).await {
                    Ok(()) => self.open(Screen::OwnerRooms).await?,
                    Err(err) => self.redirect_if_signed_out(&err, Screen::OwnerRooms),
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn draw(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(1),
                Constraint::Length(3),
            ])
            .split(size);

        self.render_header(frame, chunks[0]);
        match self.screen {
            Screen::Rooms => self.draw_rooms(frame, chunks[1]),
            Screen::MyBookings => self.draw_bookings(frame, chunks[1]),
            Screen::Dashboard => self.draw_dashboard(frame, chunks[1]),
            Screen::OwnerRooms => self.draw_owner_rooms(frame, chunks[1]),
            Screen::Login | Screen::Signup | Screen::Booking | Screen::RegisterHotel => {
                self.draw_form_screen(frame, chunks[1])
            }
        }
        self.render_help(frame, chunks[2]);
        self.render_status(frame, chunks[3]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let session = self.context.session();
        let who = match session.user() {
            Some(user) if session.is_owner() => format!("Signed in as {} (hotel owner)", user.name),
            Some(user) => format!("Signed in as {}", user.name),
            None => "Browsing as guest".to_string(),
        };
        let line = Line::from(vec![
            Span::styled(
                "Staybook",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(who, Style::default().fg(self.theme.muted)),
        ]);
        let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(paragraph, area);
    }

    fn draw_rooms(&mut self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(5)])
            .split(area);
        self.render_filters(frame, rows[0]);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(rows[1]);
        self.render_room_list(frame, columns[0]);
        self.render_room_details(frame, columns[1]);

        if let Mode::Picker(kind) = self.mode {
            self.render_picker(frame, kind);
        }
    }

    fn render_filters(&self, frame: &mut Frame, area: Rect) {
        let filters = &self.query.filters;
        let types = if filters.room_types.is_empty() {
            "any".to_string()
        } else {
            filters
                .room_types
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        };
        let prices = if filters.price_ranges.is_empty() {
            "any".to_string()
        } else {
            filters
                .price_ranges
                .iter()
                .map(|range| format!("{}{range}", self.context.config().currency))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let destination = if self.mode == Mode::Search {
            format!("{}_", self.search)
        } else if self.search.trim().is_empty() {
            "anywhere".to_string()
        } else {
            self.search.clone()
        };
        let sort = self.query.sort.label().unwrap_or("none");
        let line = Line::from(vec![
            Span::styled("Destination ", Style::default().fg(self.theme.muted)),
            Span::raw(destination),
            Span::styled("  Type ", Style::default().fg(self.theme.muted)),
            Span::raw(types),
            Span::styled("  Price ", Style::default().fg(self.theme.muted)),
            Span::raw(prices),
            Span::styled("  Sort ", Style::default().fg(self.theme.muted)),
            Span::raw(sort),
        ]);
        let paragraph = Paragraph::new(line)
            .block(Block::default().borders(Borders::ALL).title("Filters"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_room_list(&mut self, frame: &mut Frame, area: Rect) {
        let height = area.height.saturating_sub(2) as usize;
        let window = self.state.rooms.window(height, self.visible.len());
        let currency = self.context.config().currency.clone();
        let items: Vec<ListItem> = self.visible[window.clone()]
            .iter()
            .map(|room| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        room.hotel_name().to_string(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!(" · {} · {}", room.city(), room.room_type),
                        Style::default().fg(self.theme.muted),
                    ),
                    Span::raw(format!("  {}", format_price(&currency, room.price_per_night))),
                ]))
            })
            .collect();
        let title = format!("Rooms ({}/{})", self.visible.len(), self.context.rooms().len());
        self.render_list(frame, area, items, &title, self.state.rooms.selected_in(&window));
    }

    fn render_room_details(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Details");
        let Some(room) = self.current_room() else {
            let paragraph = Paragraph::new("No rooms match the current filters").block(block);
            frame.render_widget(paragraph, area);
            return;
        };
        let paragraph = Paragraph::new(self.room_lines(room))
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn room_lines(&self, room: &RoomRecord) -> Vec<Line<'static>> {
        let currency = &self.context.config().currency;
        let amenities = if room.amenities.is_empty() {
            "none listed".to_string()
        } else {
            room.amenities.iter().cloned().collect::<Vec<_>>().join(", ")
        };
        let availability = if room.is_available {
            Span::styled("Open for booking", Style::default().fg(self.theme.success))
        } else {
            Span::styled("Not available", Style::default().fg(self.theme.danger))
        };
        vec![
            Line::from(Span::styled(
                room.hotel_name().to_string(),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(format!("{}, {}", room.address(), room.city())),
            Line::from(""),
            Line::from(format!("Room: {}", room.room_type)),
            Line::from(format!(
                "Price: {} / night",
                format_price(currency, room.price_per_night)
            )),
            Line::from(format!("Rating: {:.1}", room.rating)),
            Line::from(format!("Amenities: {amenities}")),
            Line::from(format!(
                "Photos: {}{}",
                room.images.len(),
                room.cover_image()
                    .map(|url| format!(" ({url})"))
                    .unwrap_or_default()
            )),
            Line::from(format!("Listed: {}", room.created_at.format(DATE_FORMAT))),
            Line::from(availability),
        ]
    }

    fn render_picker(&self, frame: &mut Frame, kind: FilterKind) {
        let area = centered_rect(40, kind.len() as u16 + 2, frame.size());
        frame.render_widget(Clear, area);
        let currency = &self.context.config().currency;
        let items: Vec<ListItem> = (0..kind.len())
            .map(|index| {
                let (label, checked) = match kind {
                    FilterKind::RoomType => {
                        let room_type = ROOM_TYPES[index];
                        (
                            room_type.to_string(),
                            self.query.filters.room_types.contains(room_type),
                        )
                    }
                    FilterKind::PriceRange => {
                        let range = PRICE_RANGES[index];
                        (
                            format!("{currency}{range}"),
                            self.query.filters.price_ranges.contains(&range),
                        )
                    }
                };
                let mark = if checked { "[x] " } else { "[ ] " };
                ListItem::new(format!("{mark}{label}"))
            })
            .collect();
        let mut list_state = ListState::default();
        list_state.select(Some(self.state.picker));
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(kind.title()))
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn draw_form_screen(&self, frame: &mut Frame, area: Rect) {
        let Some(form) = self.form.as_ref() else {
            return;
        };

        let mut lines: Vec<Line> = Vec::new();
        if self.screen == Screen::Booking {
            if let Some(room) = self.selected_room.as_ref() {
                lines.push(Line::from(Span::styled(
                    format!("{} · {}", room.hotel_name(), room.room_type),
                    Style::default().add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(format!(
                    "{} / night",
                    format_price(&self.context.config().currency, room.price_per_night)
                )));
                lines.push(Line::from(""));
            }
        }
        let first_field_row = lines.len();

        for (index, (label, input)) in form.fields().enumerate() {
            let focused = index == form.focus();
            let marker = if focused { "> " } else { "  " };
            let label_style = if focused {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.muted)
            };
            lines.push(Line::from(vec![
                Span::raw(marker),
                Span::styled(format!("{label:<12}"), label_style),
                Span::raw(input.display()),
            ]));
        }

        let width = 64_u16.min(area.width.saturating_sub(2)).max(24);
        let height = (lines.len() as u16 + 2).min(area.height);
        let rect = centered_rect(width, height, area);
        frame.render_widget(Clear, rect);
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(form.title));
        frame.render_widget(paragraph, rect);

        if let Some((_, input)) = form.fields().nth(form.focus()) {
            let cursor_x = (rect.x + 1 + 2 + 12 + input.cursor() as u16)
                .min(rect.x + rect.width.saturating_sub(2));
            let cursor_y = rect.y + 1 + (first_field_row + form.focus()) as u16;
            frame.set_cursor(cursor_x, cursor_y);
        }
    }

    fn draw_bookings(&mut self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let height = columns[0].height.saturating_sub(2) as usize;
        let window = self.state.bookings.window(height, self.bookings.len());
        let items: Vec<ListItem> = self.bookings[window.clone()]
            .iter()
            .map(|booking| {
                let payment_style = if booking.is_paid {
                    Style::default().fg(self.theme.success)
                } else {
                    Style::default().fg(self.theme.danger)
                };
                ListItem::new(Line::from(vec![
                    Span::raw(booking.title()),
                    Span::raw("  "),
                    Span::styled(booking.payment_label(), payment_style),
                ]))
            })
            .collect();
        let title = format!("My bookings ({})", self.bookings.len());
        self.render_list(
            frame,
            columns[0],
            items,
            &title,
            self.state.bookings.selected_in(&window),
        );

        let block = Block::default().borders(Borders::ALL).title("Booking");
        let Some(booking) = self.bookings.get(self.state.bookings.cursor) else {
            frame.render_widget(Paragraph::new("No bookings yet").block(block), columns[1]);
            return;
        };
        let mut lines = self.booking_lines(booking);
        if let Some((_, url)) = self
            .payment
            .as_ref()
            .filter(|(booking_id, _)| *booking_id == booking.id)
        {
            lines.push(Line::from(""));
            lines.push(Line::from(format!("Pay at: {url}")));
        }
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, columns[1]);
    }

    fn booking_lines(&self, booking: &Booking) -> Vec<Line<'static>> {
        let currency = &self.context.config().currency;
        let mut lines = vec![
            Line::from(Span::styled(
                booking.title(),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(format!(
                "Check-in: {}",
                booking.check_in_date.format(DATE_FORMAT)
            )),
            Line::from(format!(
                "Check-out: {}",
                booking.check_out_date.format(DATE_FORMAT)
            )),
            Line::from(format!("Guests: {}", booking.guests)),
            Line::from(format!(
                "Total: {}",
                format_price(currency, booking.total_price)
            )),
            Line::from(format!(
                "Payment: {} ({})",
                booking.payment_label(),
                booking.payment_method
            )),
        ];
        if !booking.status.is_empty() {
            lines.push(Line::from(format!("Status: {}", booking.status)));
        }
        if let Some(guest) = booking.guest_name() {
            lines.push(Line::from(format!("Guest: {guest}")));
        }
        lines
    }

    fn draw_dashboard(&mut self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(5)])
            .split(area);
        let currency = self.context.config().currency.clone();
        let (total_bookings, total_revenue, bookings) = match self.dashboard.as_ref() {
            Some(summary) => (
                summary.total_bookings,
                summary.total_revenue,
                summary.bookings.clone(),
            ),
            None => (0, 0.0, Vec::new()),
        };

        let totals = Paragraph::new(vec![
            Line::from(format!("Total bookings: {total_bookings}")),
            Line::from(format!(
                "Total revenue: {}",
                format_price(&currency, total_revenue)
            )),
        ])
        .block(Block::default().borders(Borders::ALL).title("Dashboard"));
        frame.render_widget(totals, rows[0]);

        let height = rows[1].height.saturating_sub(2) as usize;
        let window = self.state.dashboard.window(height, bookings.len());
        let items: Vec<ListItem> = bookings[window.clone()]
            .iter()
            .map(|booking| {
                ListItem::new(format!(
                    "{:<16} {:<28} {:>10}  {}",
                    booking.guest_name().unwrap_or("-"),
                    booking.title(),
                    format_price(&currency, booking.total_price),
                    booking.payment_label()
                ))
            })
            .collect();
        self.render_list(
            frame,
            rows[1],
            items,
            "Recent bookings",
            self.state.dashboard.selected_in(&window),
        );
    }

    fn draw_owner_rooms(&mut self, frame: &mut Frame, area: Rect) {
        let height = area.height.saturating_sub(2) as usize;
        let window = self.state.owner_rooms.window(height, self.owner_rooms.len());
        let currency = self.context.config().currency.clone();
        let items: Vec<ListItem> = self.owner_rooms[window.clone()]
            .iter()
            .map(|room| {
                let (mark, style) = if room.is_available {
                    ("[on] ", Style::default().fg(self.theme.success))
                } else {
                    ("[off]", Style::default().fg(self.theme.danger))
                };
                let amenities = room.amenities.iter().cloned().collect::<Vec<_>>().join(", ");
                ListItem::new(Line::from(vec![
                    Span::styled(mark, style),
                    Span::raw(format!(
                        " {:<14} {:>10}  ",
                        room.room_type,
                        format_price(&currency, room.price_per_night)
                    )),
                    Span::styled(amenities, Style::default().fg(self.theme.muted)),
                ]))
            })
            .collect();
        self.render_list(
            frame,
            area,
            items,
            "Your rooms",
            self.state.owner_rooms.selected_in(&window),
        );
    }

    fn render_list(
        &self,
        frame: &mut Frame,
        area: Rect,
        items: Vec<ListItem>,
        title: &str,
        selected: Option<usize>,
    ) {
        let mut list_state = ListState::default();
        list_state.select(selected);
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title.to_string()))
            .highlight_style(Style::default().bg(self.theme.selection_bg))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let help = match (self.screen, self.mode) {
            (Screen::Rooms, Mode::Search) => "type destination  Enter/Esc done",
            (Screen::Rooms, Mode::Picker(_)) => "j/k move  Space toggle  Esc close",
            (Screen::Rooms, Mode::Browse) => {
                "/ search  t type  p price  s sort  c clear  Enter book  l login/out  u signup  b bookings  d dashboard  o rooms  h list hotel  q quit"
            }
            (Screen::Booking, _) if self.availability_confirmed => {
                "Enter book now  Tab next field  Esc cancel"
            }
            (Screen::Booking, _) => "Enter check availability  Tab next field  Esc cancel",
            (Screen::Login | Screen::Signup | Screen::RegisterHotel, _) => {
                "Enter submit  Tab next field  Esc cancel"
            }
            (Screen::MyBookings, _) => "j/k move  p pay  r refresh  Esc back",
            (Screen::Dashboard, _) => "j/k move  o rooms  r refresh  Esc back",
            (Screen::OwnerRooms, _) => "j/k move  Space toggle availability  d dashboard  Esc back",
        };
        let paragraph = Paragraph::new(Span::styled(help, Style::default().fg(self.theme.muted)));
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let color = match self.state.status_level {
            NoticeLevel::Success => self.theme.success,
            NoticeLevel::Error => self.theme.danger,
            NoticeLevel::Info => Color::Reset,
        };
        let block = Block::default().borders(Borders::ALL).title("Status");
        let paragraph = Paragraph::new(Span::styled(
            self.state.status.clone(),
            Style::default().fg(color),
        ))
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn parse_booking(room_id: &str, form: &Form) -> Result<BookingRequest, ActionError> {
    let date = |raw: &str| {
        NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
            .map_err(|_| ActionError::Invalid("Dates must be written as YYYY-MM-DD".to_string()))
    };
    let check_in = date(form.value(0))?;
    let check_out = date(form.value(1))?;
    let guests = form
        .value(2)
        .trim()
        .parse::<u32>()
        .map_err(|_| ActionError::Invalid("Guests must be a whole number".to_string()))?;
    BookingRequest::new(room_id, check_in, check_out, guests)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

/// Scroll position of one list.
#[derive(Debug, Default, Clone, Copy)]
struct ListCursor {
    cursor: usize,
    offset: usize,
    height: usize,
}

impl ListCursor {
    fn reset(&mut self) {
        self.cursor = 0;
        self.offset = 0;
    }

    fn move_by(&mut self, delta: isize, len: usize) {
        if len == 0 {
            self.reset();
            return;
        }
        let idx = (self.cursor as isize + delta).clamp(0, len as isize - 1);
        self.cursor = idx as usize;
        self.ensure_visible(len);
    }

    fn move_to(&mut self, index: usize, len: usize) {
        if len == 0 {
            self.reset();
            return;
        }
        self.cursor = index.min(len - 1);
        self.ensure_visible(len);
    }

    fn page(&mut self, forward: bool, len: usize) {
        let step = self.height.max(1).min(len.max(1)) as isize;
        self.move_by(if forward { step } else { -step }, len);
    }

    fn clamp(&mut self, len: usize) {
        if len == 0 {
            self.reset();
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }

    fn ensure_visible(&mut self, len: usize) {
        if len == 0 || self.height == 0 {
            self.offset = 0;
            return;
        }
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + self.height {
            self.offset = self.cursor + 1 - self.height;
        }
        self.offset = self.offset.min(len.saturating_sub(self.height));
    }

    /// Record the drawable height and return the visible slice range.
    fn window(&mut self, height: usize, len: usize) -> Range<usize> {
        self.height = height;
        self.clamp(len);
        self.ensure_visible(len);
        self.offset..(self.offset + height).min(len)
    }

    fn selected_in(&self, window: &Range<usize>) -> Option<usize> {
        window
            .contains(&self.cursor)
            .then(|| self.cursor - window.start)
    }
}

struct UiState {
    rooms: ListCursor,
    bookings: ListCursor,
    dashboard: ListCursor,
    owner_rooms: ListCursor,
    picker: usize,
    status: String,
    status_level: NoticeLevel,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            rooms: ListCursor::default(),
            bookings: ListCursor::default(),
            dashboard: ListCursor::default(),
            owner_rooms: ListCursor::default(),
            picker: 0,
            status: "Ready".to_string(),
            status_level: NoticeLevel::Info,
            should_quit: false,
        }
    }
}

impl UiState {
    fn set_status(&mut self, level: NoticeLevel, message: String) {
        self.status_level = level;
        self.status = message;
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn format_price(currency: &str, value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{currency}{value:.0}")
    } else {
        format!("{currency}{value:.2}")
    }
}
