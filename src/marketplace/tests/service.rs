use super::common::*;
use crate::marketplace::domain::{
    AvailabilityStatus, Difficulty, Role, TaskSegment, TaskStatus, UserId,
};
use crate::marketplace::repository::{TaskRepository, UserRepository};
use crate::marketplace::service::{MarketplaceError, NewUser};

#[test]
fn registration_deduplicates_domains_case_insensitively() {
    let (service, _, _) = build_service();

    let stored = service
        .register_user(new_freelancer("Avery Quinn", &[
            "Web Development",
            "web development ",
            "Graphic Design",
        ]))
        .expect("registration succeeds");

    assert_eq!(stored.domains.len(), 2);
    assert_eq!(stored.domains[0].level, 1);
    assert_eq!(stored.domains[0].completed_tasks, 0);
    assert!(stored.domains[0].boost_active(now()));
}

#[test]
fn freelancers_must_register_at_least_one_domain() {
    let (service, _, _) = build_service();

    let err = service
        .register_user(new_freelancer("No Domains", &[]))
        .expect_err("freelancer without domains is rejected");

    assert!(matches!(err, MarketplaceError::MissingDomains));
}

#[test]
fn clients_register_without_domains() {
    let (service, _, _) = build_service();

    let stored = service
        .register_user(NewUser {
            name: "Acme Hiring".to_string(),
            email: "hiring@acme.example".to_string(),
            role: Role::Client,
            domains: Vec::new(),
        })
        .expect("client registration succeeds");

    assert!(stored.domains.is_empty());
}

#[test]
fn add_domain_starts_a_fresh_profile() {
    let (service, _, _) = build_service();
    let stored = service
        .register_user(new_freelancer("Avery", &["SEO"]))
        .expect("registration succeeds");

    let profile = service
        .add_domain(&stored.id, "Copywriting")
        .expect("new domain accepted");

    assert_eq!(profile.domain_name, domain("Copywriting"));
    assert_eq!(profile.level, 1);
    assert!(profile.boost_active(now()));

    let err = service
        .add_domain(&stored.id, "  seo ")
        .expect_err("same domain again is a conflict");
    assert!(matches!(err, MarketplaceError::DomainAlreadyRegistered(_)));
}

#[test]
fn add_domain_for_unknown_user_is_not_found() {
    let (service, _, _) = build_service();

    let err = service
        .add_domain(&UserId("missing".to_string()), "SEO")
        .expect_err("unknown account");

    assert!(matches!(err, MarketplaceError::FreelancerNotFound));
}

#[test]
fn created_tasks_freeze_the_advisory_range() {
    let (service, _, _) = build_service();
    let client = service
        .register_user(NewUser {
            name: "Client".to_string(),
            email: "client@example.com".to_string(),
            role: Role::Client,
            domains: Vec::new(),
        })
        .expect("client registers");

    let task = service
        .create_task(new_task("Web Development", &client.id))
        .expect("task created");

    // No history yet: 500/day * 5 days, +-20%.
    assert_eq!(task.recommended_budget_range.min, 2000);
    assert_eq!(task.recommended_budget_range.max, 3000);
    assert_eq!(task.status, TaskStatus::Open);
    assert_eq!(task.deadline, task.created_at + chrono::Duration::days(5));
}

#[test]
fn zero_duration_tasks_are_rejected() {
    let (service, _, _) = build_service();
    let mut input = new_task("SEO", &UserId("client-1".to_string()));
    input.duration_days = 0;

    let err = service.create_task(input).expect_err("zero-day task");

    assert!(matches!(err, MarketplaceError::InvalidDuration));
}

#[test]
fn applying_requires_a_profile_in_the_task_domain() {
    let (service, users, tasks) = build_service();
    users
        .insert(user("f-1", "Avery", vec![fresh_profile("SEO")]))
        .expect("seed freelancer");
    tasks
        .insert(open_task("t-1", "Web Development", TaskSegment::Individual))
        .expect("seed task");

    let err = service
        .apply_to_task(
            &task_id("t-1"),
            &UserId("f-1".to_string()),
            AvailabilityStatus::Available,
        )
        .expect_err("wrong domain");

    assert!(matches!(err, MarketplaceError::DomainNotRegistered(_)));
}

#[test]
fn duplicate_applications_are_conflicts() {
    let (service, users, tasks) = build_service();
    users
        .insert(user("f-1", "Avery", vec![fresh_profile("SEO")]))
        .expect("seed freelancer");
    tasks
        .insert(open_task("t-1", "SEO", TaskSegment::Individual))
        .expect("seed task");

    let task = service
        .apply_to_task(
            &task_id("t-1"),
            &UserId("f-1".to_string()),
            AvailabilityStatus::Available,
        )
        .expect("first application");
    assert_eq!(task.applicants.len(), 1);

    let err = service
        .apply_to_task(
            &task_id("t-1"),
            &UserId("f-1".to_string()),
            AvailabilityStatus::Busy,
        )
        .expect_err("second application");
    assert!(matches!(err, MarketplaceError::AlreadyApplied));
}

#[test]
fn company_zone_gates_on_reputation() {
    let (service, users, tasks) = build_service();
    users
        .insert(user("rookie", "Rookie", vec![fresh_profile("SEO")]))
        .expect("seed rookie");
    users
        .insert(user(
            "veteran",
            "Veteran",
            vec![seasoned_profile("SEO", 20, 4.5, 92.0, 3)],
        ))
        .expect("seed veteran");
    tasks
        .insert(open_task("t-1", "SEO", TaskSegment::Company))
        .expect("seed task");

    let err = service
        .apply_to_task(
            &task_id("t-1"),
            &UserId("rookie".to_string()),
            AvailabilityStatus::Available,
        )
        .expect_err("rookie is below the gate");
    assert!(matches!(
        err,
        MarketplaceError::CompanyZoneRequirements { .. }
    ));

    service
        .apply_to_task(
            &task_id("t-1"),
            &UserId("veteran".to_string()),
            AvailabilityStatus::Available,
        )
        .expect("veteran clears the gate");
}

#[test]
fn selection_is_owner_only_and_bumps_the_assignment_counter() {
    let (service, users, tasks) = build_service();
    users
        .insert(user("f-1", "Avery", vec![fresh_profile("SEO")]))
        .expect("seed freelancer");
    tasks
        .insert(open_task("t-1", "SEO", TaskSegment::Individual))
        .expect("seed task");
    service
        .apply_to_task(
            &task_id("t-1"),
            &UserId("f-1".to_string()),
            AvailabilityStatus::Available,
        )
        .expect("application");

    let err = service
        .select_freelancer(
            &task_id("t-1"),
            &UserId("impostor".to_string()),
            &UserId("f-1".to_string()),
        )
        .expect_err("only the owner selects");
    assert!(matches!(err, MarketplaceError::NotTaskOwner));

    let task = service
        .select_freelancer(
            &task_id("t-1"),
            &UserId("client-1".to_string()),
            &UserId("f-1".to_string()),
        )
        .expect("owner selects");
    assert_eq!(task.status, TaskStatus::InProgress);
    assert_eq!(
        task.selected_freelancer_id,
        Some(UserId("f-1".to_string()))
    );

    let record = users
        .fetch(&UserId("f-1".to_string()))
        .expect("fetch")
        .expect("exists");
    assert_eq!(record.domains[0].total_assigned, 1);
}

#[test]
fn selecting_a_non_applicant_is_rejected() {
    let (service, users, tasks) = build_service();
    users
        .insert(user("f-1", "Avery", vec![fresh_profile("SEO")]))
        .expect("seed freelancer");
    tasks
        .insert(open_task("t-1", "SEO", TaskSegment::Individual))
        .expect("seed task");

    let err = service
        .select_freelancer(
            &task_id("t-1"),
            &UserId("client-1".to_string()),
            &UserId("f-1".to_string()),
        )
        .expect_err("never applied");

    assert!(matches!(err, MarketplaceError::NotAnApplicant));
}

#[test]
fn completion_is_restricted_to_the_selected_freelancer() {
    let (service, users, tasks) = build_service();
    users
        .insert(user("f-1", "Avery", vec![fresh_profile("SEO")]))
        .expect("seed freelancer");
    tasks
        .insert(open_task("t-1", "SEO", TaskSegment::Individual))
        .expect("seed task");
    service
        .apply_to_task(
            &task_id("t-1"),
            &UserId("f-1".to_string()),
            AvailabilityStatus::Available,
        )
        .expect("application");
    service
        .select_freelancer(
            &task_id("t-1"),
            &UserId("client-1".to_string()),
            &UserId("f-1".to_string()),
        )
        .expect("selection");

    let err = service
        .complete_task(&task_id("t-1"), &UserId("other".to_string()))
        .expect_err("only the selected freelancer completes");
    assert!(matches!(err, MarketplaceError::NotSelectedFreelancer));

    let task = service
        .complete_task(&task_id("t-1"), &UserId("f-1".to_string()))
        .expect("completion");
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.completed_on_time, Some(true));
}

#[test]
fn rating_updates_the_domain_profile_exactly_once() {
    let (service, users, tasks) = build_service();
    users
        .insert(user(
            "f-1",
            "Avery",
            vec![seasoned_profile("SEO", 4, 4.0, 100.0, 1)],
        ))
        .expect("seed freelancer");
    tasks
        .insert(open_task("t-1", "SEO", TaskSegment::Individual))
        .expect("seed task");
    service
        .apply_to_task(
            &task_id("t-1"),
            &UserId("f-1".to_string()),
            AvailabilityStatus::Available,
        )
        .expect("application");
    service
        .select_freelancer(
            &task_id("t-1"),
            &UserId("client-1".to_string()),
            &UserId("f-1".to_string()),
        )
        .expect("selection");
    service
        .complete_task(&task_id("t-1"), &UserId("f-1".to_string()))
        .expect("completion");

    let profile = service
        .rate_task(&task_id("t-1"), &UserId("client-1".to_string()), 5)
        .expect("first rating");

    assert_eq!(profile.completed_tasks, 5);
    assert_eq!(profile.quality_score, 4.2);
    assert_eq!(profile.reliability_score, 100.0);
    assert_eq!(profile.level, 2);

    let stored = tasks
        .fetch(&task_id("t-1"))
        .expect("fetch")
        .expect("exists");
    assert_eq!(stored.rating, Some(5));

    let err = service
        .rate_task(&task_id("t-1"), &UserId("client-1".to_string()), 4)
        .expect_err("second rating");
    assert!(matches!(err, MarketplaceError::AlreadyRated));
}

#[test]
fn ratings_outside_one_to_five_are_rejected() {
    let (service, _, _) = build_service();

    for rating in [0u8, 6] {
        let err = service
            .rate_task(&task_id("t-1"), &UserId("client-1".to_string()), rating)
            .expect_err("out-of-range rating");
        assert!(matches!(err, MarketplaceError::RatingOutOfRange(_)));
    }
}

#[test]
fn rating_waits_for_completion() {
    let (service, users, tasks) = build_service();
    users
        .insert(user("f-1", "Avery", vec![fresh_profile("SEO")]))
        .expect("seed freelancer");
    tasks
        .insert(open_task("t-1", "SEO", TaskSegment::Individual))
        .expect("seed task");

    let err = service
        .rate_task(&task_id("t-1"), &UserId("client-1".to_string()), 5)
        .expect_err("task still open");

    assert!(matches!(err, MarketplaceError::TaskNotCompleted));
}

#[test]
fn top_applicants_drops_unresolvable_entries_silently() {
    let (service, users, tasks) = build_service();
    users
        .insert(user(
            "f-1",
            "Avery",
            vec![seasoned_profile("SEO", 10, 4.0, 90.0, 2)],
        ))
        .expect("seed freelancer");
    users
        .insert(user("f-2", "Wrong Domain", vec![fresh_profile("Copywriting")]))
        .expect("seed freelancer");
    let mut task = open_task("t-1", "SEO", TaskSegment::Individual);
    for id in ["f-1", "f-2", "ghost"] {
        task.applicants.push(crate::marketplace::domain::Application {
            freelancer_id: UserId(id.to_string()),
            applied_at: now(),
            availability_status: AvailabilityStatus::Available,
        });
    }
    tasks.insert(task).expect("seed task");

    let ranked = service.top_applicants(&task_id("t-1")).expect("ranking");

    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].freelancer_id, UserId("f-1".to_string()));
}

#[test]
fn top_applicants_is_empty_for_an_unapplied_task() {
    let (service, _, tasks) = build_service();
    tasks
        .insert(open_task("t-1", "SEO", TaskSegment::Individual))
        .expect("seed task");

    let ranked = service.top_applicants(&task_id("t-1")).expect("ranking");

    assert!(ranked.is_empty());
}

#[test]
fn open_task_board_filters_by_domain() {
    let (service, _, tasks) = build_service();
    tasks
        .insert(open_task("t-1", "SEO", TaskSegment::Individual))
        .expect("seed task");
    tasks
        .insert(open_task("t-2", "Web Development", TaskSegment::Individual))
        .expect("seed task");
    let mut done = open_task("t-3", "SEO", TaskSegment::Individual);
    done.status = TaskStatus::Completed;
    tasks.insert(done).expect("seed task");

    let all = service.open_tasks(None).expect("board");
    assert_eq!(all.len(), 2);

    let seo = service.open_tasks(Some(&domain("seo"))).expect("board");
    assert_eq!(seo.len(), 1);
    assert_eq!(seo[0].id.0, "t-1");
}

#[test]
fn client_task_listing_covers_every_status() {
    let (service, _, tasks) = build_service();
    tasks
        .insert(open_task("t-1", "SEO", TaskSegment::Individual))
        .expect("seed task");
    let mut done = open_task("t-2", "SEO", TaskSegment::Individual);
    done.status = TaskStatus::Completed;
    tasks.insert(done).expect("seed task");
    let mut foreign = open_task("t-3", "SEO", TaskSegment::Individual);
    foreign.client_id = UserId("other-client".to_string());
    tasks.insert(foreign).expect("seed task");

    let mine = service
        .client_tasks(&UserId("client-1".to_string()))
        .expect("listing");

    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|task| task.client_id.0 == "client-1"));
}

#[test]
fn history_import_feeds_the_pricing_average() {
    let (service, _, _) = build_service();
    let csv = "Title,Domain,Budget,Duration,Difficulty,Status\n\
               Old gig,Video Editing,3000,5,2,Completed\n\
               Another gig,Video Editing,5000,8,2,Completed\n\
               Free favor,Video Editing,0,2,1,Completed\n\
               Never finished,Video Editing,9000,10,3,Open\n";

    let imported = service.import_history(csv.as_bytes()).expect("import");
    assert_eq!(imported, 2);

    // Average 4000, 10 days, medium: 4000 * 1.4 * 0.9 = 5040, +-20%.
    let range = service
        .budget_quote(&domain("video editing"), 10, Difficulty::Medium)
        .expect("quote");
    assert_eq!(range.min, 4032);
    assert_eq!(range.max, 6048);
}

fn task_id(id: &str) -> crate::marketplace::domain::TaskId {
    crate::marketplace::domain::TaskId(id.to_string())
}
