mod client;
mod config;
mod conversation;
mod markdown;
mod progress;
mod view;

use iced::{
    widget::{
        button, column, container, row, scrollable, text, text_editor, text_input,
        text_input::Id,
    },
    alignment, time, window, Element, Length, Size, Subscription, Task, Theme,
};
use std::time::Duration;

use client::AssistantClient;
use config::Config;
use conversation::{ContactInfo, Conversation, Phase, Sender, ThreadId};

fn main() -> iced::Result {
    let config = Config::load();

    let client = match AssistantClient::with_config(&config.backend) {
        Ok(client) => client,
        Err(e) => {
            progress::error(format!("{:#}", e));
            std::process::exit(1);
        }
    };
    progress::log(format!("Using assistant backend at {}", client.base_url()));

    let window_settings = window::Settings {
        size: Size::new(config.window.width as f32, config.window.height as f32),
        min_size: Some(Size::new(
            config.window.min_width as f32,
            config.window.min_height as f32,
        )),
        position: window::Position::Centered,
        ..Default::default()
    };

    iced::application(App::title, App::update, App::view)
        .theme(App::theme)
        .subscription(App::subscription)
        .window(window_settings)
        .run_with(move || App::new(config, client))
}

#[derive(Debug, Clone)]
enum Message {
    NameChanged(String),
    EmailChanged(String),
    SubmitContact,
    ThreadStarted(ThreadId),
    ThreadFailed(String),
    EditorAction(text_editor::Action),
    Send,
    ReplyReceived(String),
    ReplyFailed(String),
    Tick,
}

struct App {
    config: Config,
    client: AssistantClient,
    conversation: Conversation,
    name_input: String,
    email_input: String,
    editor: text_editor::Content,
    /// Parsed bodies, index-aligned with `conversation.messages()`.
    rendered: Vec<Vec<markdown::Block>>,
    loading_frame: usize,
    name_id: Id,
    messages_id: scrollable::Id,
}

/// Editor contents as typed. `Content::text` always ends with a line break.
fn editor_text(content: &text_editor::Content) -> String {
    let mut text = content.text();
    if text.ends_with('\n') {
        text.pop();
    }
    text
}

impl App {
    fn new(config: Config, client: AssistantClient) -> (Self, Task<Message>) {
        let name_id = Id::unique();

        let app = App {
            config,
            client,
            conversation: Conversation::new(),
            name_input: String::new(),
            email_input: String::new(),
            editor: text_editor::Content::new(),
            rendered: Vec::new(),
            loading_frame: 0,
            name_id: name_id.clone(),
            messages_id: scrollable::Id::unique(),
        };

        (app, text_input::focus(name_id))
    }

    fn title(&self) -> String {
        format!("{} support", self.config.assistant.name)
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::NameChanged(value) => {
                self.name_input = value;
                Task::none()
            }
            Message::EmailChanged(value) => {
                self.email_input = value;
                Task::none()
            }
            Message::SubmitContact => {
                let contact = ContactInfo {
                    name: self.name_input.clone(),
                    email: self.email_input.clone(),
                };
                let Some(contact) = self.conversation.submit_contact(contact) else {
                    return Task::none();
                };

                let client = self.client.clone();

                Task::future(async move {
                    match client.start_thread(&contact).await {
                        Ok(thread_id) => Message::ThreadStarted(thread_id),
                        Err(e) => Message::ThreadFailed(format!("{:#}", e)),
                    }
                })
            }
            Message::ThreadStarted(thread_id) => {
                progress::log(format!("Chat started on thread {}", thread_id));
                self.conversation.thread_started(thread_id);
                Task::none()
            }
            Message::ThreadFailed(error) => {
                progress::error(format!("Error starting chat: {}", error));
                self.conversation.thread_failed();
                Task::none()
            }
            Message::EditorAction(action) => {
                self.editor.perform(action);
                self.conversation.set_draft(editor_text(&self.editor));
                Task::none()
            }
            Message::Send => {
                let Some(outgoing) = self.conversation.submit_message() else {
                    return Task::none();
                };
                self.editor = text_editor::Content::new();
                self.loading_frame = 0;
                self.sync_rendered();

                let client = self.client.clone();

                let exchange = Task::future(async move {
                    match client.send_message(&outgoing.thread_id, &outgoing.text).await {
                        Ok(reply) => Message::ReplyReceived(reply),
                        Err(e) => Message::ReplyFailed(format!("{:#}", e)),
                    }
                });

                Task::batch([exchange, self.scroll_to_latest()])
            }
            Message::ReplyReceived(reply) => {
                self.conversation.reply_received(reply);
                self.sync_rendered();
                self.scroll_to_latest()
            }
            Message::ReplyFailed(error) => {
                progress::error(format!("Error sending message: {}", error));
                self.conversation.reply_failed();
                Task::none()
            }
            Message::Tick => {
                if self.conversation.is_busy() {
                    self.loading_frame = self.loading_frame.wrapping_add(1);
                }
                Task::none()
            }
        }
    }

    /// Parses any messages appended since the last sync. Bot text goes through
    /// markdown, user text is shown as typed.
    fn sync_rendered(&mut self) {
        let messages = self.conversation.messages();
        for message in &messages[self.rendered.len()..] {
            let blocks = match message.sender {
                Sender::Bot => markdown::parse(&message.text),
                Sender::User => markdown::literal(&message.text),
            };
            self.rendered.push(blocks);
        }
    }

    fn has_scroll_target(&self) -> bool {
        !self.conversation.messages().is_empty()
    }

    fn scroll_to_latest(&self) -> Task<Message> {
        if !self.has_scroll_target() {
            return Task::none();
        }
        scrollable::snap_to(self.messages_id.clone(), scrollable::RelativeOffset::END)
    }

    fn subscription(&self) -> Subscription<Message> {
        if self.conversation.is_busy() {
            time::every(Duration::from_millis(80)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        }
    }

    fn view(&self) -> Element<'_, Message> {
        let body = match self.conversation.phase() {
            Phase::Intake | Phase::Starting => self.intake_view(),
            Phase::Chat { .. } => self.chat_view(),
        };

        let mut content = column![body].spacing(8).padding(12);

        if progress::debug_enabled() {
            let log_lines = progress::recent(3)
                .into_iter()
                .map(|entry| -> Element<Message> {
                    text(format!("[{}] {}", entry.kind.tag(), entry.text)).size(11).into()
                });
            content = content.push(column(log_lines).spacing(2));
        }

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn intake_view(&self) -> Element<'_, Message> {
        let starting = matches!(self.conversation.phase(), Phase::Starting);

        let header = container(
            column![
                view::avatar(&self.config.assistant.name),
                text(self.config.assistant.name.as_str()).size(28),
                text(self.config.assistant.greeting.as_str()).size(17),
            ]
            .spacing(12)
            .align_x(alignment::Horizontal::Center),
        )
        .padding(24)
        .width(Length::Fill)
        .style(view::header_style);

        let name = text_input("Name", &self.name_input)
            .on_input(Message::NameChanged)
            .on_submit(Message::SubmitContact)
            .padding(12)
            .id(self.name_id.clone());

        let email = text_input("Email", &self.email_input)
            .on_input(Message::EmailChanged)
            .on_submit(Message::SubmitContact)
            .padding(12);

        let label = if starting { "Starting..." } else { "Start" };
        let start = button(
            container(text(label))
                .width(Length::Fill)
                .align_x(alignment::Horizontal::Center),
        )
        .on_press_maybe((!starting).then_some(Message::SubmitContact))
        .padding(10)
        .width(Length::Fill);

        column![header, column![name, email, start].spacing(14).padding(12)]
            .spacing(8)
            .into()
    }

    fn chat_view(&self) -> Element<'_, Message> {
        let mut title = column![text(self.config.assistant.name.as_str()).size(20)].spacing(2);
        if let Some(contact) = self.conversation.contact() {
            if !contact.name.is_empty() {
                title = title.push(text(format!("Chatting as {}", contact.name)).size(12));
            }
        }

        let header = container(title)
            .padding(16)
            .width(Length::Fill)
            .style(view::header_style);

        let mut list = column![].spacing(8).padding(8);
        for (message, blocks) in self.conversation.messages().iter().zip(&self.rendered) {
            list = list.push(view::bubble(message.sender, blocks));
        }
        if self.conversation.is_busy() {
            list = list.push(view::loading_bubble(self.loading_frame));
        }

        let messages = scrollable(list)
            .id(self.messages_id.clone())
            .height(Length::Fill);

        let editor = text_editor(&self.editor)
            .placeholder("Type a message...")
            .on_action(Message::EditorAction)
            .key_binding(|key_press| {
                if conversation::is_send_key(&key_press.key, key_press.modifiers) {
                    Some(text_editor::Binding::Custom(Message::Send))
                } else {
                    text_editor::Binding::from_key_press(key_press)
                }
            })
            .padding(10);

        let can_send =
            !self.conversation.is_busy() && !self.conversation.draft().trim().is_empty();
        let send = button(text("Send"))
            .on_press_maybe(can_send.then_some(Message::Send))
            .padding([10, 16]);

        let input = row![editor, send]
            .spacing(8)
            .align_y(alignment::Vertical::Bottom);

        column![header, messages, input].spacing(8).into()
    }

    fn theme(&self) -> Theme {
        Theme::Light
    }
}
