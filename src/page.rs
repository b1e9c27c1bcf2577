use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::behaviors::{AlertElement, AlertWidget, Behavior, RemoveOnClose, ScrollTopButton};
use crate::dom::{Dom, NodeId};
use crate::dom_utils::truncate_chars;
use crate::html::parse_html;
use crate::{Error, Result};

/// One file registered against a file input, standing in for a user's pick in
/// the native file dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// A recorded programmatic scroll request (`smooth` marks animated requests).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRequest {
    pub top: i64,
    pub smooth: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTimer {
    pub id: i64,
    pub due_at: i64,
    pub order: i64,
}

#[derive(Debug, Clone)]
pub(crate) enum PageTask {
    CloseAlert {
        target: NodeId,
    },
    RevertCartButton {
        target: NodeId,
        original_label: String,
        success_class: String,
    },
    DeliverFilePreview {
        preview: NodeId,
        data_url: String,
    },
}

impl PageTask {
    fn kind(&self) -> &'static str {
        match self {
            Self::CloseAlert { .. } => "close_alert",
            Self::RevertCartButton { .. } => "revert_cart_button",
            Self::DeliverFilePreview { .. } => "deliver_file_preview",
        }
    }
}

#[derive(Debug, Clone)]
struct ScheduledTask {
    id: i64,
    due_at: i64,
    order: i64,
    task: PageTask,
}

#[derive(Debug, Clone)]
pub(crate) struct CartPending {
    pub(crate) timer_id: i64,
    pub(crate) original_label: String,
}

#[derive(Default)]
struct ListenerStore {
    map: HashMap<NodeId, HashMap<String, Vec<Behavior>>>,
}

impl ListenerStore {
    fn add(&mut self, node_id: NodeId, event: String, behavior: Behavior) {
        self.map
            .entry(node_id)
            .or_default()
            .entry(event)
            .or_default()
            .push(behavior);
    }

    fn get(&self, node_id: NodeId, event: &str) -> Vec<Behavior> {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug)]
struct DialogState {
    alert_messages: Vec<String>,
    confirm_messages: Vec<String>,
    confirm_responses: VecDeque<bool>,
    default_confirm_response: bool,
}

impl Default for DialogState {
    fn default() -> Self {
        Self {
            alert_messages: Vec::new(),
            confirm_messages: Vec::new(),
            confirm_responses: VecDeque::new(),
            default_confirm_response: false,
        }
    }
}

/// A server-rendered page plus the deterministic browser state the behaviors
/// run against: virtual clock, timer queue, scripted dialogs, selected files,
/// and a virtual vertical scroll offset.
pub struct Page {
    pub(crate) dom: Dom,
    listeners: ListenerStore,
    task_queue: Vec<ScheduledTask>,
    now_ms: i64,
    timer_step_limit: usize,
    next_timer_id: i64,
    next_task_order: i64,
    dialogs: DialogState,
    selected_files: HashMap<NodeId, Vec<SelectedFile>>,
    pub(crate) cart_pending: HashMap<NodeId, CartPending>,
    scroll_y: i64,
    scroll_watchers: Vec<ScrollTopButton>,
    scroll_requests: Vec<ScrollRequest>,
    alert_widget: Rc<dyn AlertWidget>,
    trace: bool,
    trace_events: bool,
    trace_timers: bool,
    trace_logs: Vec<String>,
    trace_log_limit: usize,
    trace_to_stderr: bool,
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        let dom = parse_html(html)?;
        Ok(Self {
            dom,
            listeners: ListenerStore::default(),
            task_queue: Vec::new(),
            now_ms: 0,
            timer_step_limit: 10_000,
            next_timer_id: 1,
            next_task_order: 0,
            dialogs: DialogState::default(),
            selected_files: HashMap::new(),
            cart_pending: HashMap::new(),
            scroll_y: 0,
            scroll_watchers: Vec::new(),
            scroll_requests: Vec::new(),
            alert_widget: Rc::new(RemoveOnClose),
            trace: false,
            trace_events: true,
            trace_timers: true,
            trace_logs: Vec::new(),
            trace_log_limit: 10_000,
            trace_to_stderr: true,
        })
    }

    /// Swaps the alert widget implementation used when a scheduled alert
    /// dismissal fires.
    pub fn set_alert_widget(&mut self, widget: Rc<dyn AlertWidget>) {
        self.alert_widget = widget;
    }

    // ----- user actions -------------------------------------------------

    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }

        let tag = self
            .dom
            .tag_name(target)
            .ok_or_else(|| Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: "non-element".into(),
            })?
            .to_ascii_lowercase();

        if tag != "input" && tag != "textarea" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: tag,
            });
        }

        self.dom.set_value(target, text)?;
        self.dispatch_event(target, "input")?;
        Ok(())
    }

    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }
        self.dispatch_event(target, "click")?;
        Ok(())
    }

    pub fn dispatch(&mut self, selector: &str, event: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.dispatch_event(target, event)?;
        Ok(())
    }

    pub(crate) fn dispatch_event(&mut self, target: NodeId, event_type: &str) -> Result<()> {
        self.trace_event_line(format!(
            "[event] dispatch type={} target={}",
            event_type, target.0
        ));

        // Target phase plus bubble through ancestors.
        let mut cursor = Some(target);
        while let Some(node) = cursor {
            let behaviors = self.listeners.get(node, event_type);
            for behavior in behaviors {
                behavior.run(self, target)?;
            }
            cursor = self.dom.parent(node);
        }
        Ok(())
    }

    pub(crate) fn add_listener(&mut self, node: NodeId, event: &str, behavior: Behavior) {
        self.listeners.add(node, event.to_string(), behavior);
    }

    // ----- scroll model -------------------------------------------------

    pub fn scroll_y(&self) -> i64 {
        self.scroll_y
    }

    /// Moves the virtual scroll position and re-evaluates installed scroll
    /// watchers, like a scroll event firing in a browser.
    pub fn set_scroll_y(&mut self, y: i64) -> Result<()> {
        self.scroll_y = y;
        self.trace_event_line(format!("[scroll] y={y}"));
        self.run_scroll_watchers()
    }

    pub fn scroll_requests(&self) -> &[ScrollRequest] {
        &self.scroll_requests
    }

    pub(crate) fn install_scroll_watcher(&mut self, watcher: ScrollTopButton) {
        self.scroll_watchers.push(watcher);
    }

    pub(crate) fn request_scroll(&mut self, top: i64, smooth: bool) -> Result<()> {
        self.scroll_requests.push(ScrollRequest { top, smooth });
        self.trace_event_line(format!("[scroll] request top={top} smooth={smooth}"));
        self.scroll_y = top;
        self.run_scroll_watchers()
    }

    fn run_scroll_watchers(&mut self) -> Result<()> {
        let watchers = self.scroll_watchers.clone();
        for watcher in watchers {
            watcher.apply(self)?;
        }
        Ok(())
    }

    // ----- dialogs ------------------------------------------------------

    /// Queues the response for the next confirm prompt (FIFO).
    pub fn enqueue_confirm_response(&mut self, accepted: bool) {
        self.dialogs.confirm_responses.push_back(accepted);
    }

    pub fn set_default_confirm_response(&mut self, accepted: bool) {
        self.dialogs.default_confirm_response = accepted;
    }

    pub fn alert_messages(&self) -> &[String] {
        &self.dialogs.alert_messages
    }

    pub fn take_alert_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.dialogs.alert_messages)
    }

    pub fn confirm_messages(&self) -> &[String] {
        &self.dialogs.confirm_messages
    }

    pub(crate) fn show_alert(&mut self, message: &str) {
        self.trace_event_line(format!("[dialog] alert message={message}"));
        self.dialogs.alert_messages.push(message.to_string());
    }

    pub(crate) fn confirm(&mut self, message: &str) -> bool {
        self.dialogs.confirm_messages.push(message.to_string());
        let accepted = self
            .dialogs
            .confirm_responses
            .pop_front()
            .unwrap_or(self.dialogs.default_confirm_response);
        self.trace_event_line(format!(
            "[dialog] confirm message={message} accepted={accepted}"
        ));
        accepted
    }

    // ----- file selection -----------------------------------------------

    /// Registers a single selected file on a file input, replacing any prior
    /// selection, and fires its change event.
    pub fn choose_file(&mut self, selector: &str, file: SelectedFile) -> Result<()> {
        self.choose_files(selector, vec![file])
    }

    pub fn choose_files(&mut self, selector: &str, files: Vec<SelectedFile>) -> Result<()> {
        let target = self.file_input(selector)?;
        self.selected_files.insert(target, files);
        self.dispatch_event(target, "change")
    }

    pub fn clear_files(&mut self, selector: &str) -> Result<()> {
        let target = self.file_input(selector)?;
        self.selected_files.remove(&target);
        self.dispatch_event(target, "change")
    }

    fn file_input(&self, selector: &str) -> Result<NodeId> {
        let target = self.select_one(selector)?;
        let tag = self
            .dom
            .tag_name(target)
            .unwrap_or_default()
            .to_ascii_lowercase();
        let kind = self
            .dom
            .attr(target, "type")
            .unwrap_or_else(|| "text".into())
            .to_ascii_lowercase();
        if tag != "input" || kind != "file" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input[type=file]".into(),
                actual: if tag == "input" {
                    format!("input[type={kind}]")
                } else {
                    tag
                },
            });
        }
        Ok(target)
    }

    pub(crate) fn files_for(&self, node: NodeId) -> &[SelectedFile] {
        self.selected_files
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // ----- virtual clock and timer queue --------------------------------

    pub fn now_ms(&self) -> i64 {
        self.now_ms
    }

    pub(crate) fn schedule_task(&mut self, delay_ms: i64, task: PageTask) -> i64 {
        let delay_ms = delay_ms.max(0);
        let id = self.next_timer_id;
        self.next_timer_id += 1;
        let order = self.next_task_order;
        self.next_task_order += 1;
        let due_at = self.now_ms.saturating_add(delay_ms);
        self.trace_timer_line(format!(
            "[timer] schedule id={id} due_at={due_at} kind={}",
            task.kind()
        ));
        self.task_queue.push(ScheduledTask {
            id,
            due_at,
            order,
            task,
        });
        id
    }

    pub fn clear_timer(&mut self, timer_id: i64) -> bool {
        let before = self.task_queue.len();
        self.task_queue.retain(|task| task.id != timer_id);
        let existed = self.task_queue.len() != before;
        self.trace_timer_line(format!("[timer] clear id={timer_id} existed={existed}"));
        existed
    }

    pub fn clear_all_timers(&mut self) -> usize {
        let cleared = self.task_queue.len();
        self.task_queue.clear();
        self.trace_timer_line(format!("[timer] clear_all cleared={cleared}"));
        cleared
    }

    pub fn pending_timers(&self) -> Vec<PendingTimer> {
        let mut timers = self
            .task_queue
            .iter()
            .map(|task| PendingTimer {
                id: task.id,
                due_at: task.due_at,
                order: task.order,
            })
            .collect::<Vec<_>>();
        timers.sort_by_key(|timer| (timer.due_at, timer.order));
        timers
    }

    pub fn set_timer_step_limit(&mut self, max_steps: usize) -> Result<()> {
        if max_steps == 0 {
            return Err(Error::Behavior(
                "set_timer_step_limit requires at least 1 step".into(),
            ));
        }
        self.timer_step_limit = max_steps;
        Ok(())
    }

    pub fn advance_time(&mut self, delta_ms: i64) -> Result<()> {
        if delta_ms < 0 {
            return Err(Error::Behavior(
                "advance_time requires non-negative milliseconds".into(),
            ));
        }
        let from = self.now_ms;
        self.now_ms = self.now_ms.saturating_add(delta_ms);
        let ran = self.run_due_timers_internal()?;
        self.trace_timer_line(format!(
            "[timer] advance delta_ms={} from={} to={} ran_due={}",
            delta_ms, from, self.now_ms, ran
        ));
        Ok(())
    }

    pub fn advance_time_to(&mut self, target_ms: i64) -> Result<()> {
        if target_ms < self.now_ms {
            return Err(Error::Behavior(format!(
                "advance_time_to requires target >= now_ms (target={target_ms}, now_ms={})",
                self.now_ms
            )));
        }
        let from = self.now_ms;
        self.now_ms = target_ms;
        let ran = self.run_due_timers_internal()?;
        self.trace_timer_line(format!(
            "[timer] advance_to from={} to={} ran_due={}",
            from, self.now_ms, ran
        ));
        Ok(())
    }

    /// Runs every pending task in due order, advancing the clock to each
    /// task's deadline.
    pub fn flush(&mut self) -> Result<()> {
        let from = self.now_ms;
        let ran = self.run_timer_queue(None, true)?;
        self.trace_timer_line(format!(
            "[timer] flush from={} to={} ran={}",
            from, self.now_ms, ran
        ));
        Ok(())
    }

    pub fn run_next_timer(&mut self) -> Result<bool> {
        let Some(next_idx) = self.next_task_index(None) else {
            self.trace_timer_line("[timer] run_next none".into());
            return Ok(false);
        };

        let task = self.task_queue.remove(next_idx);
        if task.due_at > self.now_ms {
            self.now_ms = task.due_at;
        }
        self.execute_timer_task(task)?;
        Ok(true)
    }

    pub fn run_due_timers(&mut self) -> Result<usize> {
        let ran = self.run_due_timers_internal()?;
        self.trace_timer_line(format!(
            "[timer] run_due now_ms={} ran={}",
            self.now_ms, ran
        ));
        Ok(ran)
    }

    fn run_due_timers_internal(&mut self) -> Result<usize> {
        self.run_timer_queue(Some(self.now_ms), false)
    }

    fn run_timer_queue(&mut self, due_limit: Option<i64>, advance_clock: bool) -> Result<usize> {
        let mut steps = 0usize;
        while let Some(next_idx) = self.next_task_index(due_limit) {
            steps += 1;
            if steps > self.timer_step_limit {
                return Err(Error::Behavior(format!(
                    "flush exceeded max task steps: limit={}, steps={steps}, now_ms={}, pending_tasks={}",
                    self.timer_step_limit,
                    self.now_ms,
                    self.task_queue.len()
                )));
            }
            let task = self.task_queue.remove(next_idx);
            if advance_clock && task.due_at > self.now_ms {
                self.now_ms = task.due_at;
            }
            self.execute_timer_task(task)?;
        }
        Ok(steps)
    }

    fn next_task_index(&self, due_limit: Option<i64>) -> Option<usize> {
        self.task_queue
            .iter()
            .enumerate()
            .filter(|(_, task)| {
                if let Some(limit) = due_limit {
                    task.due_at <= limit
                } else {
                    true
                }
            })
            .min_by_key(|(_, task)| (task.due_at, task.order))
            .map(|(idx, _)| idx)
    }

    fn execute_timer_task(&mut self, task: ScheduledTask) -> Result<()> {
        self.trace_timer_line(format!(
            "[timer] run id={} due_at={} kind={} now_ms={}",
            task.id,
            task.due_at,
            task.task.kind(),
            self.now_ms
        ));

        match task.task {
            PageTask::CloseAlert { target } => {
                if self.dom.is_connected(target) {
                    let widget = Rc::clone(&self.alert_widget);
                    widget.close(AlertElement::new(&mut self.dom, target))?;
                }
            }
            PageTask::RevertCartButton {
                target,
                original_label,
                success_class,
            } => {
                self.cart_pending.remove(&target);
                if self.dom.is_connected(target) {
                    self.dom.set_text_content(target, &original_label)?;
                    self.dom.class_remove(target, &success_class)?;
                    self.dom.set_disabled(target, false)?;
                }
            }
            PageTask::DeliverFilePreview { preview, data_url } => {
                if self.dom.is_connected(preview) {
                    self.dom.set_attr(preview, "src", &data_url)?;
                    self.dom.style_set(preview, "display", "block")?;
                }
            }
        }
        Ok(())
    }

    // ----- assertions and diagnostics -----------------------------------

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.text_content(target);
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.value(target)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_style(&self, selector: &str, property: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.style_get(target, property)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: format!("{property}: {expected}"),
                actual: format!("{property}: {actual}"),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_exists(&self, selector: &str) -> Result<()> {
        let _ = self.select_one(selector)?;
        Ok(())
    }

    pub fn assert_missing(&self, selector: &str) -> Result<()> {
        if let Some(target) = self.dom.query_selector(selector)? {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: "no match".into(),
                actual: "one or more matches".into(),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.dump_node(target))
    }

    pub(crate) fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node_id), 200)
    }

    // ----- trace --------------------------------------------------------

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace_events = enabled;
    }

    pub fn set_trace_timers(&mut self, enabled: bool) {
        self.trace_timers = enabled;
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_to_stderr = enabled;
    }

    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::Behavior(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace_log_limit = max_entries;
        while self.trace_logs.len() > self.trace_log_limit {
            self.trace_logs.remove(0);
        }
        Ok(())
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.trace_logs)
    }

    pub(crate) fn trace_event_line(&mut self, line: String) {
        if self.trace && self.trace_events {
            self.push_trace_line(line);
        }
    }

    pub(crate) fn trace_timer_line(&mut self, line: String) {
        if self.trace && self.trace_timers {
            self.push_trace_line(line);
        }
    }

    fn push_trace_line(&mut self, line: String) {
        if self.trace_to_stderr {
            eprintln!("{line}");
        }
        self.trace_logs.push(line);
        while self.trace_logs.len() > self.trace_log_limit {
            self.trace_logs.remove(0);
        }
    }
}
