use std::fmt;

/// The BMAD agent roster stories can be assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentName {
    BmadOrchestrator,
    Dev,
    Architect,
    Qa,
    Pm,
    UxExpert,
    Analyst,
    Po,
    Sm,
    InfraDevopsPlatform,
    BmadTheCreator,
    BmadMaster,
}

impl AgentName {
    pub const ALL: [AgentName; 12] = [
        AgentName::BmadOrchestrator,
        AgentName::Dev,
        AgentName::Architect,
        AgentName::Qa,
        AgentName::Pm,
        AgentName::UxExpert,
        AgentName::Analyst,
        AgentName::Po,
        AgentName::Sm,
        AgentName::InfraDevopsPlatform,
        AgentName::BmadTheCreator,
        AgentName::BmadMaster,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentName::BmadOrchestrator => "bmad-orchestrator",
            AgentName::Dev => "dev",
            AgentName::Architect => "architect",
            AgentName::Qa => "qa",
            AgentName::Pm => "pm",
            AgentName::UxExpert => "ux-expert",
            AgentName::Analyst => "analyst",
            AgentName::Po => "po",
            AgentName::Sm => "sm",
            AgentName::InfraDevopsPlatform => "infra-devops-platform",
            AgentName::BmadTheCreator => "bmad-the-creator",
            AgentName::BmadMaster => "bmad-master",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AgentName::BmadOrchestrator => "BMAD Orchestrator",
            AgentName::Dev => "Development Agent",
            AgentName::Architect => "Architecture Agent",
            AgentName::Qa => "Quality Assurance Agent",
            AgentName::Pm => "Product Manager Agent",
            AgentName::UxExpert => "UX Expert Agent",
            AgentName::Analyst => "Data Analyst Agent",
            AgentName::Po => "Product Owner Agent",
            AgentName::Sm => "Scrum Master Agent",
            AgentName::InfraDevopsPlatform => "Infrastructure Agent",
            AgentName::BmadTheCreator => "Creator Agent",
            AgentName::BmadMaster => "BMAD Master Agent",
        }
    }

    pub fn from_key(key: &str) -> Option<AgentName> {
        AgentName::ALL.into_iter().find(|a| a.as_str() == key)
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracker-side assignee for a story's agent key. Unknown agents have none.
pub fn map_agent_to_user(agent: Option<&str>) -> Option<&'static str> {
    agent
        .and_then(|key| AgentName::from_key(key.trim()))
        .map(|a| a.display_name())
}
