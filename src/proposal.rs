//! Proposal record, version snapshots and the negotiation thread
use crate::error::StructuralError;
use crate::item::{ItemNormalizer, RawServiceItem, ServiceItem};
use crate::settlement::{SettlementOptions, SettlementRule};
use chrono::{DateTime, TimeZone, Utc};
use uuid7::uuid7;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .unwrap()
            .into()
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalStatus {
    #[n(0)]
    Submitted,
    #[n(1)]
    Negotiation,
    #[n(2)]
    Accepted,
    #[n(3)]
    Rejected,
}

impl ProposalStatus {
    /// A terminal lineage accepts no further versions or transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProposalStatus::Accepted | ProposalStatus::Rejected)
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationStatus {
    #[n(0)]
    Initial,
    #[n(1)]
    Counteroffer,
    #[n(2)]
    Revision,
    #[n(3)]
    Accepted,
    #[n(4)]
    Rejected,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationAction {
    #[n(0)]
    Submit,
    #[n(1)]
    Counteroffer,
    #[n(2)]
    Revision,
    #[n(3)]
    Accept,
    #[n(4)]
    Reject,
}

impl NegotiationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            NegotiationAction::Submit => "submit",
            NegotiationAction::Counteroffer => "counteroffer",
            NegotiationAction::Revision => "revision",
            NegotiationAction::Accept => "accept",
            NegotiationAction::Reject => "reject",
        }
    }
}

/// One transition event in the append-only negotiation thread.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct ThreadEntry {
    #[n(0)]
    pub version: u32,
    #[n(1)]
    pub action: NegotiationAction,
    #[n(2)]
    pub actor_id: String,
    #[n(3)]
    pub changed_fields: Vec<String>,
    #[n(4)]
    pub timestamp: TimeStamp<Utc>,
    #[n(5)]
    pub notes: Option<String>,
}

impl ThreadEntry {
    pub fn new(
        version: u32,
        action: NegotiationAction,
        actor_id: String,
        changed_fields: Vec<String>,
        timestamp: TimeStamp<Utc>,
        notes: Option<String>,
    ) -> Self {
        Self {
            version,
            action,
            actor_id,
            changed_fields,
            timestamp,
            notes,
        }
    }
}

/// Immutable copy of one version's content fields. History entries never carry
/// their own history or thread, so snapshots do not nest.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct ProposalSnapshot {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub version: u32,
    #[n(2)]
    pub proposed_by: String,
    #[n(3)]
    pub services_offered: Vec<ServiceItem>,
    #[n(4)]
    pub services_requested: Vec<ServiceItem>,
    #[n(5)]
    pub settlement_rule: Option<SettlementRule>,
    #[n(6)]
    pub cash_component: Option<f64>,
    #[n(7)]
    pub explicit_waiver: bool,
    #[n(8)]
    pub timeline: Option<String>,
    #[n(9)]
    pub terms: Option<String>,
    #[n(10)]
    pub dispute_resolution: Option<String>,
    #[n(11)]
    pub status: ProposalStatus,
    #[n(12)]
    pub negotiation_status: NegotiationStatus,
}

/// One version of a barter/hybrid exchange proposal, including the embedded
/// version history and negotiation thread of its lineage.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct BarterProposal {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub lineage_root_id: String,
    #[n(2)]
    pub version: u32,
    #[n(3)]
    pub proposed_by: String,
    #[n(4)]
    pub opportunity_owner: String,
    #[n(5)]
    pub services_offered: Vec<ServiceItem>,
    #[n(6)]
    pub services_requested: Vec<ServiceItem>,
    #[n(7)]
    pub settlement_rule: Option<SettlementRule>,
    #[n(8)]
    pub cash_component: Option<f64>,
    #[n(9)]
    pub explicit_waiver: bool,
    #[n(10)]
    pub timeline: Option<String>,
    #[n(11)]
    pub terms: Option<String>,
    #[n(12)]
    pub dispute_resolution: Option<String>,
    #[n(13)]
    pub status: ProposalStatus,
    #[n(14)]
    pub negotiation_status: NegotiationStatus,
    #[n(15)]
    pub version_history: Vec<ProposalSnapshot>,
    #[n(16)]
    pub negotiation_thread: Vec<ThreadEntry>,
}

impl BarterProposal {
    /// Immutable snapshot of this version's content fields.
    pub fn snapshot(&self) -> ProposalSnapshot {
        ProposalSnapshot {
            id: self.id.clone(),
            version: self.version,
            proposed_by: self.proposed_by.clone(),
            services_offered: self.services_offered.clone(),
            services_requested: self.services_requested.clone(),
            settlement_rule: self.settlement_rule,
            cash_component: self.cash_component,
            explicit_waiver: self.explicit_waiver,
            timeline: self.timeline.clone(),
            terms: self.terms.clone(),
            dispute_resolution: self.dispute_resolution.clone(),
            status: self.status,
            negotiation_status: self.negotiation_status,
        }
    }

    pub fn settlement_options(&self) -> SettlementOptions {
        SettlementOptions {
            cash_component: self.cash_component,
            explicit_waiver: self.explicit_waiver,
        }
    }

    /// The two negotiating parties: `(original proposer, opportunity owner)`.
    /// The original proposer is read from the version-1 snapshot once the
    /// lineage has history.
    pub fn participants(&self) -> (String, String) {
        let original = self
            .version_history
            .first()
            .map(|snapshot| snapshot.proposed_by.clone())
            .unwrap_or_else(|| self.proposed_by.clone());

        (original, self.opportunity_owner.clone())
    }

    pub fn push_thread_entry(&mut self, entry: ThreadEntry) {
        self.negotiation_thread.push(entry);
    }

    /// Render the negotiation thread for display, one line per transition.
    pub fn render_thread(&self) -> String {
        let mut lines = Vec::with_capacity(self.negotiation_thread.len());
        for entry in &self.negotiation_thread {
            let mut line = format!(
                "v{} {} by {}",
                entry.version,
                entry.action.as_str(),
                entry.actor_id
            );
            if !entry.changed_fields.is_empty() {
                line.push_str(&format!(
                    " ({} field(s): {})",
                    entry.changed_fields.len(),
                    entry.changed_fields.join(", ")
                ));
            }
            if let Some(notes) = &entry.notes {
                line.push_str(&format!(" -- {notes}"));
            }
            lines.push(line);
        }
        lines.join("\n")
    }
}

/// Builder for the first version of a proposal lineage.
#[derive(Debug, Default)]
pub struct ProposalDraft {
    proposed_by: Option<String>,
    opportunity_owner: Option<String>,
    services_offered: Vec<RawServiceItem>,
    services_requested: Vec<RawServiceItem>,
    settlement_rule: Option<SettlementRule>,
    cash_component: Option<f64>,
    explicit_waiver: bool,
    timeline: Option<String>,
    terms: Option<String>,
    dispute_resolution: Option<String>,
}

impl ProposalDraft {
    /// Construct a new builder object, this becomes the basis for a draft
    pub fn new() -> Self {
        Self::default()
    }
    pub fn proposed_by(mut self, actor_id: &str) -> Self {
        self.proposed_by = Some(actor_id.to_string());
        self
    }
    pub fn opportunity_owner(mut self, actor_id: &str) -> Self {
        self.opportunity_owner = Some(actor_id.to_string());
        self
    }
    pub fn offer_service(mut self, item: RawServiceItem) -> Self {
        self.services_offered.push(item);
        self
    }
    pub fn request_service(mut self, item: RawServiceItem) -> Self {
        self.services_requested.push(item);
        self
    }
    pub fn set_settlement_rule(mut self, rule: SettlementRule) -> Self {
        self.settlement_rule = Some(rule);
        self
    }
    pub fn set_cash_component(mut self, amount: f64) -> Self {
        self.cash_component = Some(amount);
        self
    }
    pub fn set_explicit_waiver(mut self, waiver: bool) -> Self {
        self.explicit_waiver = waiver;
        self
    }
    pub fn set_timeline(mut self, timeline: &str) -> Self {
        self.timeline = Some(timeline.to_string());
        self
    }
    pub fn set_terms(mut self, terms: &str) -> Self {
        self.terms = Some(terms.to_string());
        self
    }
    pub fn set_dispute_resolution(mut self, clause: &str) -> Self {
        self.dispute_resolution = Some(clause.to_string());
        self
    }

    /// Normalize the raw baskets and mint the version-1 proposal of a fresh
    /// lineage. The lineage root id is the version-1 id.
    pub fn finalise<N: ItemNormalizer>(
        self,
        normalizer: &N,
    ) -> Result<BarterProposal, StructuralError> {
        let proposed_by = self
            .proposed_by
            .ok_or(StructuralError::MissingParticipant { role: "proposer" })?;
        let opportunity_owner = self
            .opportunity_owner
            .ok_or(StructuralError::MissingParticipant {
                role: "opportunity owner",
            })?;

        let mut services_offered = Vec::with_capacity(self.services_offered.len());
        for raw in &self.services_offered {
            services_offered.push(normalizer.normalize(raw)?);
        }
        let mut services_requested = Vec::with_capacity(self.services_requested.len());
        for raw in &self.services_requested {
            services_requested.push(normalizer.normalize(raw)?);
        }

        let id = uuid7().to_string();

        Ok(BarterProposal {
            lineage_root_id: id.clone(),
            id,
            version: 1,
            proposed_by,
            opportunity_owner,
            services_offered,
            services_requested,
            settlement_rule: self.settlement_rule,
            cash_component: self.cash_component,
            explicit_waiver: self.explicit_waiver,
            timeline: self.timeline,
            terms: self.terms,
            dispute_resolution: self.dispute_resolution,
            status: ProposalStatus::Submitted,
            negotiation_status: NegotiationStatus::Initial,
            version_history: vec![],
            negotiation_thread: vec![],
        })
    }
}

/// Field replacements applied when a new version is created. `None` keeps the
/// base version's value.
#[derive(Debug, Default, Clone)]
pub struct ProposalUpdate {
    pub services_offered: Option<Vec<ServiceItem>>,
    pub services_requested: Option<Vec<ServiceItem>>,
    pub settlement_rule: Option<SettlementRule>,
    pub cash_component: Option<f64>,
    pub explicit_waiver: Option<bool>,
    pub timeline: Option<String>,
    pub terms: Option<String>,
    pub dispute_resolution: Option<String>,
}

impl ProposalUpdate {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_services_offered(mut self, items: Vec<ServiceItem>) -> Self {
        self.services_offered = Some(items);
        self
    }
    pub fn set_services_requested(mut self, items: Vec<ServiceItem>) -> Self {
        self.services_requested = Some(items);
        self
    }
    pub fn set_settlement_rule(mut self, rule: SettlementRule) -> Self {
        self.settlement_rule = Some(rule);
        self
    }
    pub fn set_cash_component(mut self, amount: f64) -> Self {
        self.cash_component = Some(amount);
        self
    }
    pub fn set_explicit_waiver(mut self, waiver: bool) -> Self {
        self.explicit_waiver = Some(waiver);
        self
    }
    pub fn set_timeline(mut self, timeline: &str) -> Self {
        self.timeline = Some(timeline.to_string());
        self
    }
    pub fn set_terms(mut self, terms: &str) -> Self {
        self.terms = Some(terms.to_string());
        self
    }
    pub fn set_dispute_resolution(mut self, clause: &str) -> Self {
        self.dispute_resolution = Some(clause.to_string());
        self
    }
}
