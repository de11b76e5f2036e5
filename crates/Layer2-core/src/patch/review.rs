//! 승인 게이트 기반 diff 리뷰어

use super::engine::{DiffReviewer, PatchProposal, ReviewDecision};
use async_trait::async_trait;
use toolgate_foundation::{CommandGate, ConfirmationRequest, PermissionAction};
use tracing::debug;

/// diff 를 승인 요청의 상세 내용으로 보여주는 리뷰어
#[derive(Debug, Clone)]
pub struct GateReviewer {
    gate: CommandGate,
}

impl GateReviewer {
    pub fn new(gate: CommandGate) -> Self {
        Self { gate }
    }
}

#[async_trait]
impl DiffReviewer for GateReviewer {
    async fn review(&self, proposal: &PatchProposal) -> ReviewDecision {
        let request = ConfirmationRequest::new(PermissionAction::file_write(
            &proposal.display_path,
        ))
        .with_detail(proposal.diff());

        match self.gate.authorize(request).await {
            Ok(()) => ReviewDecision::Accept,
            Err(e) => {
                debug!("Proposal {} rejected: {}", proposal.id, e);
                ReviewDecision::Reject
            }
        }
    }
}
