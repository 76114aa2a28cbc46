use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rolegate_core::{AppError, AppResult};
use rolegate_domain::{AccessRequest, AccessRequestInput, Credentials, RoleArn};
use tokio::sync::Mutex;

use crate::access_ports::{
    ApprovalStatusSource, NotificationMessage, NotificationPublisher, NotificationReceipt,
    RoleAssumptionService,
};

pub(crate) const SECRET_ACCESS_KEY: &str = "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY";
pub(crate) const SESSION_TOKEN: &str = "FwoGZXIvYXdzEBYaDEXAMPLESESSIONTOKEN";

pub(crate) fn sample_request() -> AccessRequest {
    AccessRequest::new(AccessRequestInput {
        requester_name: Some("Ada".to_owned()),
        requester_email: Some("ada@example.com".to_owned()),
        account_id: Some("123".to_owned()),
        role_name: Some("Admin".to_owned()),
    })
    .unwrap_or_else(|_| unreachable!())
}

/// Approval source answering from a script, then repeating its fallback.
pub(crate) struct ScriptedApprovalSource {
    script: Mutex<VecDeque<AppResult<bool>>>,
    fallback: bool,
    checks: Mutex<u32>,
}

impl ScriptedApprovalSource {
    pub(crate) fn always(approved: bool) -> Arc<Self> {
        Self::scripted(Vec::new(), approved)
    }

    pub(crate) fn scripted(script: Vec<AppResult<bool>>, fallback: bool) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            checks: Mutex::new(0),
        })
    }

    pub(crate) async fn checks(&self) -> u32 {
        *self.checks.lock().await
    }
}

#[async_trait]
impl ApprovalStatusSource for ScriptedApprovalSource {
    async fn check_approval(&self, _request: &AccessRequest) -> AppResult<bool> {
        *self.checks.lock().await += 1;
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or(Ok(self.fallback))
    }
}

#[derive(Default)]
pub(crate) struct RecordingPublisher {
    pub(crate) fail: bool,
    pub(crate) messages: Mutex<Vec<NotificationMessage>>,
}

#[async_trait]
impl NotificationPublisher for RecordingPublisher {
    async fn publish(&self, message: NotificationMessage) -> AppResult<NotificationReceipt> {
        if self.fail {
            return Err(AppError::Notification("topic unreachable".to_owned()));
        }

        let message_id = format!("msg-{}", message.request_id);
        self.messages.lock().await.push(message);
        Ok(NotificationReceipt { message_id })
    }
}

#[derive(Default)]
pub(crate) struct FakeRoleAssumption {
    pub(crate) fail: bool,
    pub(crate) calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl RoleAssumptionService for FakeRoleAssumption {
    async fn assume_role(&self, role_arn: &RoleArn, session_name: &str) -> AppResult<Credentials> {
        self.calls
            .lock()
            .await
            .push((role_arn.as_str().to_owned(), session_name.to_owned()));

        if self.fail {
            return Err(AppError::Internal(
                "AccessDenied: not authorized to perform sts:AssumeRole".to_owned(),
            ));
        }

        Ok(Credentials::new(
            "ASIAEXAMPLE",
            SECRET_ACCESS_KEY,
            SESSION_TOKEN,
            Utc.with_ymd_and_hms(2026, 10, 16, 13, 0, 0)
                .single()
                .unwrap_or_else(|| unreachable!()),
        ))
    }
}
