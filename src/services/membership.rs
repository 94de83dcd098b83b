use crate::database::models::{EventAttendee, HelpHelper, HelpStatus, JoinStatus, TeamMember};
use crate::database::repositories::{EventRepository, HelpRequestRepository, TeamRepository};
use crate::error::AppError;

/// Join/leave for events and teams, offer/withdraw for help requests.
#[derive(Clone)]
pub struct MembershipService {
    event_repository: EventRepository,
    team_repository: TeamRepository,
    help_request_repository: HelpRequestRepository,
}

impl MembershipService {
    pub fn new(
        event_repository: EventRepository,
        team_repository: TeamRepository,
        help_request_repository: HelpRequestRepository,
    ) -> Self {
        Self {
            event_repository,
            team_repository,
            help_request_repository,
        }
    }

    pub async fn join_event(&self, event_id: &str, user_id: &str) -> Result<EventAttendee, AppError> {
        let event = self
            .event_repository
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| AppError::not_found("Event not found"))?;

        let attendee_count = self.event_repository.count_attendees(event_id).await?;
        if !event.has_capacity_for(attendee_count) {
            return Err(AppError::conflict("Event is full"));
        }

        if self
            .event_repository
            .find_attendance(event_id, user_id)
            .await?
            .is_some()
        {
            return Err(AppError::conflict("Already joined this event"));
        }

        // The insert re-checks capacity; a concurrent join can still fill the last seat.
        let attendance = self
            .event_repository
            .add_attendee_if_room(event_id, user_id)
            .await
            .map_err(|e| AppError::conflict_on_unique(e, "Already joined this event"))?;

        match attendance {
            Some(attendance) => {
                log::info!("User {} joined event {}", user_id, event_id);
                Ok(attendance)
            }
            None if self.event_repository.find_by_id(event_id).await?.is_none() => {
                Err(AppError::not_found("Event not found"))
            }
            None => Err(AppError::conflict("Event is full")),
        }
    }

    pub async fn leave_event(&self, event_id: &str, user_id: &str) -> Result<(), AppError> {
        if self.event_repository.find_by_id(event_id).await?.is_none() {
            return Err(AppError::not_found("Event not found"));
        }

        if !self.event_repository.remove_attendee(event_id, user_id).await? {
            return Err(AppError::conflict("Not attending this event"));
        }

        log::info!("User {} left event {}", user_id, event_id);
        Ok(())
    }

    pub async fn event_join_status(
        &self,
        event_id: &str,
        user_id: &str,
    ) -> Result<JoinStatus, AppError> {
        let attendance = self
            .event_repository
            .find_attendance(event_id, user_id)
            .await?;

        Ok(JoinStatus {
            joined: attendance.is_some(),
            attendance,
        })
    }

    pub async fn join_team(&self, team_id: &str, user_id: &str) -> Result<TeamMember, AppError> {
        let team = self
            .team_repository
            .find_by_id(team_id)
            .await?
            .ok_or_else(|| AppError::not_found("Team not found"))?;

        if !team.is_public {
            return Err(AppError::forbidden(
                "Cannot join a private team without invitation",
            ));
        }

        if self
            .team_repository
            .find_member(team_id, user_id)
            .await?
            .is_some()
        {
            return Err(AppError::conflict("Already a member of this team"));
        }

        let member = self
            .team_repository
            .add_member(team_id, user_id)
            .await
            .map_err(|e| AppError::conflict_on_unique(e, "Already a member of this team"))?;

        log::info!("User {} joined team {}", user_id, team_id);
        Ok(member)
    }

    pub async fn leave_team(&self, team_id: &str, user_id: &str) -> Result<(), AppError> {
        let team = self
            .team_repository
            .find_by_id(team_id)
            .await?
            .ok_or_else(|| AppError::not_found("Team not found"))?;

        if team.creator_id == user_id {
            return Err(AppError::conflict(
                "Team creator cannot leave the team. Transfer ownership or delete the team instead.",
            ));
        }

        if !self.team_repository.remove_member(team_id, user_id).await? {
            return Err(AppError::conflict("Not a member of this team"));
        }

        log::info!("User {} left team {}", user_id, team_id);
        Ok(())
    }

    /// Adds the caller as a helper and moves the request to in-progress on the first offer.
    pub async fn offer_help(
        &self,
        help_request_id: &str,
        user_id: &str,
    ) -> Result<HelpHelper, AppError> {
        let help_request = self
            .help_request_repository
            .find_by_id(help_request_id)
            .await?
            .ok_or_else(|| AppError::not_found("Help request not found"))?;

        if help_request.status != HelpStatus::Open {
            return Err(AppError::conflict(format!(
                "This request is {}",
                help_request.status
            )));
        }

        if self
            .help_request_repository
            .find_helper(help_request_id, user_id)
            .await?
            .is_some()
        {
            return Err(AppError::conflict("Already offering help for this request"));
        }

        let repository = &self.help_request_repository;
        let mut tx = repository.begin().await?;

        let inserted = repository
            .insert_helper_if_open(&mut tx, help_request_id, user_id)
            .await
            .map_err(|e| {
                AppError::conflict_on_unique(e, "Already offering help for this request")
            })?;

        let Some(helper) = inserted else {
            // Status moved (or the request vanished) since the pre-check.
            return match repository.current_status(&mut tx, help_request_id).await? {
                Some(status) => Err(AppError::conflict(format!("This request is {}", status))),
                None => Err(AppError::not_found("Help request not found")),
            };
        };

        let after = repository.count_helpers(&mut tx, help_request_id).await?;
        let current = repository
            .current_status(&mut tx, help_request_id)
            .await?
            .ok_or_else(|| AppError::not_found("Help request not found"))?;

        let next = current.next_status(after - 1, after);
        if next != current {
            repository.set_status(&mut tx, help_request_id, next).await?;
        }

        tx.commit().await?;

        log::info!("User {} offered help on {}", user_id, help_request_id);
        Ok(helper)
    }

    /// Removes the caller as a helper; the last helper leaving reopens an in-progress request.
    pub async fn withdraw_help(&self, help_request_id: &str, user_id: &str) -> Result<(), AppError> {
        let repository = &self.help_request_repository;

        if repository.find_by_id(help_request_id).await?.is_none() {
            return Err(AppError::not_found("Help request not found"));
        }

        let mut tx = repository.begin().await?;

        if !repository
            .remove_helper(&mut tx, help_request_id, user_id)
            .await?
        {
            return Err(AppError::conflict("Not offering help for this request"));
        }

        let after = repository.count_helpers(&mut tx, help_request_id).await?;
        let current = repository
            .current_status(&mut tx, help_request_id)
            .await?
            .ok_or_else(|| AppError::not_found("Help request not found"))?;

        let next = current.next_status(after + 1, after);
        if next != current {
            repository.set_status(&mut tx, help_request_id, next).await?;
        }

        tx.commit().await?;

        log::info!("User {} withdrew help from {}", user_id, help_request_id);
        Ok(())
    }
}
