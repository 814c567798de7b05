use std::fmt;

/// Tracker workflow states local story statuses are mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WorkflowState {
    Todo,
    InProgress,
    InReview,
    Done,
    Blocked,
}

impl WorkflowState {
    pub const ALL: [WorkflowState; 5] = [
        WorkflowState::Todo,
        WorkflowState::InProgress,
        WorkflowState::InReview,
        WorkflowState::Done,
        WorkflowState::Blocked,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            WorkflowState::Todo => "Todo",
            WorkflowState::InProgress => "In Progress",
            WorkflowState::InReview => "In Review",
            WorkflowState::Done => "Done",
            WorkflowState::Blocked => "Blocked",
        }
    }

    /// Linear's state category.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowState::Todo => "unstarted",
            WorkflowState::Done => "completed",
            WorkflowState::InProgress | WorkflowState::InReview | WorkflowState::Blocked => {
                "started"
            }
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            WorkflowState::Todo => "#e2e2e2",
            WorkflowState::InProgress => "#f2c94c",
            WorkflowState::InReview => "#5e6ad2",
            WorkflowState::Done => "#5e9e6e",
            WorkflowState::Blocked => "#eb5757",
        }
    }

    /// Map a story's status field. Unknown and missing statuses are Todo.
    pub fn from_status(status: Option<&str>) -> WorkflowState {
        let Some(status) = status else {
            return WorkflowState::Todo;
        };
        match status.trim().to_ascii_lowercase().as_str() {
            "draft" | "ready" => WorkflowState::Todo,
            "in_progress" => WorkflowState::InProgress,
            "review" => WorkflowState::InReview,
            "done" => WorkflowState::Done,
            "blocked" => WorkflowState::Blocked,
            _ => WorkflowState::Todo,
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Linear priority number for a story's priority label.
pub fn linear_priority(priority: &str) -> Option<u8> {
    match priority.trim().to_ascii_lowercase().as_str() {
        "urgent" => Some(1),
        "high" => Some(2),
        "medium" => Some(3),
        "low" => Some(4),
        _ => None,
    }
}
