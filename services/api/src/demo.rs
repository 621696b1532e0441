use crate::infra::InMemoryRemotePort;
use clap::Args;
use offer_match::error::AppError;
use offer_match::workflows::matching::{
    CompanyId, OfferId, SessionStore, SessionUser, StepOutcome, StudentId, WorkflowCoordinator,
    WorkflowTrace,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Student applying to the offer
    #[arg(long, default_value_t = 7)]
    pub(crate) student_id: u64,
    /// Offer to apply to (the seeded offer is 42)
    #[arg(long, default_value_t = 42)]
    pub(crate) offer_id: u64,
    /// Response status the company sends back
    #[arg(long, default_value = "seleccionado")]
    pub(crate) status: String,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        student_id,
        offer_id,
        status,
    } = args;
    let student_id = StudentId(student_id);
    let offer_id = OfferId(offer_id);

    let port = Arc::new(InMemoryRemotePort::seeded());
    let coordinator = WorkflowCoordinator::new(port.clone());
    let sessions = SessionStore::new(2, Duration::from_secs(60));

    let student_session = sessions.open(SessionUser::Student(student_id))?;
    let company_session = sessions.open(SessionUser::Company(CompanyId(9)))?;

    println!("Offer matching demo");

    let student = sessions.get(&student_session)?;
    {
        let mut context = student.lock().await;
        let state = &mut context.offer_detail;

        let trace = coordinator.load_offer_with_company(state, offer_id).await;
        render_trace(&trace);
        match (&state.offer, &state.company) {
            (Some(offer), Some(company)) => {
                println!("  offer {}: {} ({})", offer.id, offer.title, company.name)
            }
            (Some(offer), None) => println!("  offer {}: {}", offer.id, offer.title),
            (None, _) => println!("  offer {offer_id} not found"),
        }

        let trace = coordinator
            .check_existing_application(state, student_id, offer_id)
            .await;
        render_trace(&trace);
        println!("  already applied: {}", state.already_applied);

        let report = coordinator.apply_to_offer(state, student_id, offer_id).await;
        render_trace(&report.trace);
        println!("  application succeeded: {}", report.succeeded);
    }

    let company = sessions.get(&company_session)?;
    let company_user = company.lock().await.user;
    let inbox = coordinator.inbox(company_user).await?;
    println!("\nCompany inbox ({} notifications)", inbox.len());
    for notification in &inbox {
        println!(
            "- #{} [{}] {}",
            notification
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "?".to_string()),
            notification.kind.label(),
            notification.message
        );
    }

    if let Some(notice_id) = inbox.iter().find_map(|notification| notification.id) {
        let report = coordinator
            .respond_to_notification(notice_id, &status)
            .await;
        render_trace(&report.trace);

        let mut context = student.lock().await;
        let trace = coordinator
            .load_notification_status(&mut context.offer_detail, notice_id)
            .await;
        render_trace(&trace);
        println!(
            "  notification {} answered with {}",
            notice_id,
            context
                .offer_detail
                .response_status
                .as_deref()
                .unwrap_or("nothing")
        );
    }

    let student_user = student.lock().await.user;
    let inbox = coordinator.inbox(student_user).await?;
    println!("\nStudent inbox ({} notifications)", inbox.len());
    for notification in &inbox {
        println!("- [{}] {}", notification.kind.label(), notification.message);
    }

    sessions.close(&student_session)?;
    sessions.close(&company_session)?;
    println!(
        "\nStored notifications: {}",
        port.notifications().len()
    );

    Ok(())
}

fn render_trace(trace: &WorkflowTrace) {
    println!("\nWorkflow {:?}", trace.workflow);
    for record in &trace.steps {
        let outcome = match &record.outcome {
            StepOutcome::Completed => "completed".to_string(),
            StepOutcome::Failed { reason } => format!("failed: {reason}"),
            StepOutcome::Skipped { reason } => format!("skipped: {reason}"),
        };
        println!("- {} ({:?}): {}", record.step.label(), record.policy, outcome);
    }
}
