// quill-service/src/tests/sharing_tests.rs
#[cfg(test)]
mod tests {
    use crate::access::resolve;
    use crate::models::{
        Actor, CreateTeamFile, GrantAccessRequest, ServiceError, Team, TeamMember, TeamRole,
    };
    use crate::realtime::{RoomEvent, RoomHub};
    use crate::sharing;
    use crate::store::Store;
    use crate::tests::{make_user, test_store};
    use chrono::Utc;
    use uuid::Uuid;

    fn make_team(store: &Store, name: &str, members: Vec<(&str, TeamRole)>) -> Team {
        let now = Utc::now();
        let team = Team {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            logo: None,
            members: members
                .into_iter()
                .map(|(user_id, role)| TeamMember {
                    user_id: user_id.to_string(),
                    role,
                })
                .collect(),
            files: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        store.save_team(&team).expect("save team");
        // Mirror the back-reference the way team creation does
        for member in &team.members {
            if let Some(mut user) = store.find_user_by_id(&member.user_id).unwrap() {
                user.teams.push(team.id.clone());
                store.save_user(&user).unwrap();
            }
        }
        store.find_team_by_id(&team.id).unwrap().unwrap()
    }

    fn actor_for(store: &Store, user_id: &str) -> Actor {
        let user = store.find_user_by_id(user_id).unwrap().unwrap();
        Actor::from(&user)
    }

    fn grant_user(user_id: &str, role: &str) -> GrantAccessRequest {
        GrantAccessRequest {
            user_id: Some(user_id.to_string()),
            team_id: None,
            role: role.to_string(),
        }
    }

    fn grant_team(team_id: &str, role: &str) -> GrantAccessRequest {
        GrantAccessRequest {
            user_id: None,
            team_id: Some(team_id.to_string()),
            role: role.to_string(),
        }
    }

    #[test]
    fn team_document_creation_seeds_owner_and_team_entries() {
        let store = test_store();
        let u1 = make_user(&store, "u1");
        let u2 = make_user(&store, "u2");
        let team = make_team(
            &store,
            "Eng",
            vec![(&u1.id, TeamRole::Admin), (&u2.id, TeamRole::Member)],
        );

        let doc = sharing::create_team_document(
            &store,
            &actor_for(&store, &u1.id),
            &CreateTeamFile {
                title: "Design Doc".to_string(),
                content: String::new(),
                team_id: team.id.clone(),
                team_role: None,
                access: None,
            },
        )
        .expect("create team doc");

        // Exactly the owner entry and the team-scoped entry
        assert_eq!(doc.access.len(), 2);
        assert!(doc.access.iter().any(|e| e.is_member(&u1.id)));
        assert!(doc.access.iter().any(|e| e.is_team(&team.id)));

        // The team's file list picked up the document
        let team = store.find_team_by_id(&team.id).unwrap().unwrap();
        assert_eq!(team.files, vec![doc.id.clone()]);

        // u2 resolves through the team-scoped entry (a member of the team),
        // not through any direct grant
        let u2_actor = actor_for(&store, &u2.id);
        assert!(resolve(&u2_actor, &doc).is_some());
        assert!(!doc.access.iter().any(|e| e.is_member(&u2.id)));
    }

    #[test]
    fn team_file_creation_requires_editor_in_team() {
        let store = test_store();
        let u1 = make_user(&store, "u1");
        let u2 = make_user(&store, "u2");
        let team = make_team(
            &store,
            "Eng",
            vec![(&u1.id, TeamRole::Admin), (&u2.id, TeamRole::Member)],
        );

        let result = sharing::create_team_document(
            &store,
            &actor_for(&store, &u2.id),
            &CreateTeamFile {
                title: "Sneaky".to_string(),
                content: String::new(),
                team_id: team.id.clone(),
                team_role: None,
                access: None,
            },
        );
        assert_eq!(result.unwrap_err(), ServiceError::Denied);
    }

    #[test]
    fn duplicate_member_grant_is_a_conflict() {
        let store = test_store();
        let hub = RoomHub::new();
        let u1 = make_user(&store, "u1");
        let u2 = make_user(&store, "u2");
        let team = make_team(&store, "Eng", vec![(&u1.id, TeamRole::Admin)]);
        let doc = sharing::create_team_document(
            &store,
            &actor_for(&store, &u1.id),
            &CreateTeamFile {
                title: "Doc".to_string(),
                content: String::new(),
                team_id: team.id,
                team_role: None,
                access: None,
            },
        )
        .unwrap();

        let admin = actor_for(&store, &u1.id);
        sharing::grant_access(&store, &hub, &admin, &doc.id, &grant_user(&u2.id, "viewer"))
            .expect("first grant");

        let err = sharing::grant_access(&store, &hub, &admin, &doc.id, &grant_user(&u2.id, "editor"))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn invalid_role_is_rejected_before_any_lookup() {
        let store = test_store();
        let hub = RoomHub::new();
        let u1 = make_user(&store, "u1");
        let admin = actor_for(&store, &u1.id);

        let err = sharing::grant_access(
            &store,
            &hub,
            &admin,
            "no-such-file",
            &grant_user("whoever", "superuser"),
        )
        .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn team_grant_expands_to_a_membership_snapshot() {
        let store = test_store();
        let hub = RoomHub::new();
        let u1 = make_user(&store, "u1");
        let u2 = make_user(&store, "u2");
        let u3 = make_user(&store, "u3");
        let team = make_team(
            &store,
            "Eng",
            vec![(&u1.id, TeamRole::Admin), (&u2.id, TeamRole::Member)],
        );

        // A personal document shared with the whole team
        let doc = {
            use crate::models::{AccessEntry, AccessRole, Document, DocumentKind};
            let now = Utc::now();
            let doc = Document {
                id: Uuid::new_v4().to_string(),
                title: "Notes".to_string(),
                content: String::new(),
                owner: u1.id.clone(),
                kind: DocumentKind::Personal,
                access: vec![AccessEntry::member(u1.id.clone(), AccessRole::Admin)],
                created_at: now,
                updated_at: now,
            };
            store.save_document(&doc).unwrap();
            doc
        };

        let admin = actor_for(&store, &u1.id);
        let doc = sharing::grant_access(&store, &hub, &admin, &doc.id, &grant_team(&team.id, "editor"))
            .expect("team grant");

        // One member entry per current team member; u1 keeps the existing
        // admin entry untouched
        assert!(doc.access.iter().any(|e| e.is_member(&u2.id)));
        assert_eq!(doc.access.iter().filter(|e| e.is_member(&u1.id)).count(), 1);

        // Someone joining the team afterwards gains nothing from the grant
        sharing::add_team_members(&store, &admin, &team.id, &[u3.id.clone()]).expect("add member");
        let doc = store.find_document_by_id(&doc.id).unwrap().unwrap();
        let u3_actor = actor_for(&store, &u3.id);
        assert_eq!(resolve(&u3_actor, &doc), None);
    }

    #[test]
    fn owner_seeded_below_admin_is_raised_at_creation() {
        use crate::models::{AccessEntry, AccessRole};
        let store = test_store();
        let u1 = make_user(&store, "u1");
        let team = make_team(&store, "Eng", vec![(&u1.id, TeamRole::Admin)]);

        // The creator seeds their own entry at viewer
        let doc = sharing::create_team_document(
            &store,
            &actor_for(&store, &u1.id),
            &CreateTeamFile {
                title: "Doc".to_string(),
                content: String::new(),
                team_id: team.id.clone(),
                team_role: Some("viewer".to_string()),
                access: Some(vec![AccessEntry::member(u1.id.clone(), AccessRole::Viewer)]),
            },
        )
        .unwrap();

        // The entry is raised in place, not duplicated
        let owner_entries: Vec<_> = doc.access.iter().filter(|e| e.is_member(&u1.id)).collect();
        assert_eq!(owner_entries.len(), 1);
        assert_eq!(owner_entries[0].role, AccessRole::Admin);
        assert_eq!(
            resolve(&actor_for(&store, &u1.id), &doc),
            Some(AccessRole::Admin)
        );
    }

    #[test]
    fn owner_entry_cannot_be_revoked() {
        let store = test_store();
        let hub = RoomHub::new();
        let u1 = make_user(&store, "u1");
        let team = make_team(&store, "Eng", vec![(&u1.id, TeamRole::Admin)]);
        let doc = sharing::create_team_document(
            &store,
            &actor_for(&store, &u1.id),
            &CreateTeamFile {
                title: "Doc".to_string(),
                content: String::new(),
                team_id: team.id,
                team_role: None,
                access: None,
            },
        )
        .unwrap();

        let owner_entry = doc
            .access
            .iter()
            .find(|e| e.is_member(&u1.id))
            .unwrap()
            .id
            .clone();

        let admin = actor_for(&store, &u1.id);
        let err = sharing::revoke_access(&store, &hub, &admin, &doc.id, &owner_entry).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        // The entry is still there
        let doc = store.find_document_by_id(&doc.id).unwrap().unwrap();
        assert!(doc.access.iter().any(|e| e.id == owner_entry));
    }

    #[test]
    fn revoked_member_no_longer_resolves() {
        let store = test_store();
        let hub = RoomHub::new();
        let u1 = make_user(&store, "u1");
        let u2 = make_user(&store, "u2");
        let team = make_team(&store, "Eng", vec![(&u1.id, TeamRole::Admin)]);
        let doc = sharing::create_team_document(
            &store,
            &actor_for(&store, &u1.id),
            &CreateTeamFile {
                title: "Doc".to_string(),
                content: String::new(),
                team_id: team.id,
                team_role: None,
                access: None,
            },
        )
        .unwrap();

        let admin = actor_for(&store, &u1.id);
        let doc = sharing::grant_access(&store, &hub, &admin, &doc.id, &grant_user(&u2.id, "editor"))
            .unwrap();
        let entry_id = doc
            .access
            .iter()
            .find(|e| e.is_member(&u2.id))
            .unwrap()
            .id
            .clone();

        let mut rx = hub.join(&doc.id);
        let doc = sharing::revoke_access(&store, &hub, &admin, &doc.id, &entry_id).unwrap();

        let u2_actor = actor_for(&store, &u2.id);
        assert_eq!(resolve(&u2_actor, &doc), None);

        // Room members were told to re-fetch
        assert_eq!(
            rx.try_recv().unwrap(),
            RoomEvent::AccessChanged {
                document_id: doc.id.clone()
            }
        );
    }

    #[test]
    fn non_admin_cannot_revoke() {
        let store = test_store();
        let hub = RoomHub::new();
        let u1 = make_user(&store, "u1");
        let u2 = make_user(&store, "u2");
        let team = make_team(&store, "Eng", vec![(&u1.id, TeamRole::Admin)]);
        let doc = sharing::create_team_document(
            &store,
            &actor_for(&store, &u1.id),
            &CreateTeamFile {
                title: "Doc".to_string(),
                content: String::new(),
                team_id: team.id,
                team_role: None,
                access: None,
            },
        )
        .unwrap();

        let admin = actor_for(&store, &u1.id);
        let doc = sharing::grant_access(&store, &hub, &admin, &doc.id, &grant_user(&u2.id, "viewer"))
            .unwrap();
        let entry_id = doc
            .access
            .iter()
            .find(|e| e.is_member(&u2.id))
            .unwrap()
            .id
            .clone();

        let viewer = actor_for(&store, &u2.id);
        let err = sharing::revoke_access(&store, &hub, &viewer, &doc.id, &entry_id).unwrap_err();
        assert_eq!(err, ServiceError::Denied);
    }

    #[test]
    fn edit_access_changes_role_in_place() {
        let store = test_store();
        let hub = RoomHub::new();
        let u1 = make_user(&store, "u1");
        let u2 = make_user(&store, "u2");
        let team = make_team(&store, "Eng", vec![(&u1.id, TeamRole::Admin)]);
        let doc = sharing::create_team_document(
            &store,
            &actor_for(&store, &u1.id),
            &CreateTeamFile {
                title: "Doc".to_string(),
                content: String::new(),
                team_id: team.id,
                team_role: None,
                access: None,
            },
        )
        .unwrap();

        let admin = actor_for(&store, &u1.id);
        let doc = sharing::grant_access(&store, &hub, &admin, &doc.id, &grant_user(&u2.id, "viewer"))
            .unwrap();
        let entry_id = doc
            .access
            .iter()
            .find(|e| e.is_member(&u2.id))
            .unwrap()
            .id
            .clone();

        let doc = sharing::edit_access(&store, &hub, &admin, &doc.id, &entry_id, "admin").unwrap();

        let u2_actor = actor_for(&store, &u2.id);
        assert_eq!(
            resolve(&u2_actor, &doc),
            Some(crate::models::AccessRole::Admin)
        );
    }

    #[test]
    fn adding_and_removing_members_updates_both_sides() {
        let store = test_store();
        let u1 = make_user(&store, "u1");
        let u2 = make_user(&store, "u2");
        let team = make_team(&store, "Eng", vec![(&u1.id, TeamRole::Admin)]);

        let admin = actor_for(&store, &u1.id);
        let team = sharing::add_team_members(&store, &admin, &team.id, &[u2.id.clone()]).unwrap();
        assert!(team.is_member(&u2.id));
        assert_eq!(team.role_of(&u2.id), Some(TeamRole::Member));

        let u2_record = store.find_user_by_id(&u2.id).unwrap().unwrap();
        assert!(u2_record.teams.contains(&team.id));

        // Adding the same member again is a conflict, not a no-op
        let err = sharing::add_team_members(&store, &admin, &team.id, &[u2.id.clone()]).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let team = sharing::remove_team_members(&store, &admin, &team.id, &[u2.id.clone()]).unwrap();
        assert!(!team.is_member(&u2.id));
        let u2_record = store.find_user_by_id(&u2.id).unwrap().unwrap();
        assert!(!u2_record.teams.contains(&team.id));
    }

    #[test]
    fn removing_a_member_keeps_their_expanded_document_access() {
        // The snapshot model cuts both ways: leaving the team does not walk
        // back entries that were expanded from an earlier team grant.
        let store = test_store();
        let hub = RoomHub::new();
        let u1 = make_user(&store, "u1");
        let u2 = make_user(&store, "u2");
        let team = make_team(
            &store,
            "Eng",
            vec![(&u1.id, TeamRole::Admin), (&u2.id, TeamRole::Member)],
        );

        let doc = sharing::create_team_document(
            &store,
            &actor_for(&store, &u1.id),
            &CreateTeamFile {
                title: "Doc".to_string(),
                content: String::new(),
                team_id: team.id.clone(),
                team_role: None,
                access: None,
            },
        )
        .unwrap();

        let admin = actor_for(&store, &u1.id);
        sharing::grant_access(&store, &hub, &admin, &doc.id, &grant_user(&u2.id, "editor"))
            .unwrap();

        sharing::remove_team_members(&store, &admin, &team.id, &[u2.id.clone()]).unwrap();

        let doc = store.find_document_by_id(&doc.id).unwrap().unwrap();
        let u2_actor = actor_for(&store, &u2.id);
        // Team-set is gone, so the team entry no longer matches, but the
        // direct entry survives
        assert!(u2_actor.teams.is_empty());
        assert_eq!(
            resolve(&u2_actor, &doc),
            Some(crate::models::AccessRole::Editor)
        );
    }

    #[test]
    fn unlinking_documents_clears_both_views_of_the_link() {
        let store = test_store();
        let hub = RoomHub::new();
        let u1 = make_user(&store, "u1");
        let team = make_team(&store, "Eng", vec![(&u1.id, TeamRole::Admin)]);
        let doc = sharing::create_team_document(
            &store,
            &actor_for(&store, &u1.id),
            &CreateTeamFile {
                title: "Doc".to_string(),
                content: String::new(),
                team_id: team.id.clone(),
                team_role: None,
                access: None,
            },
        )
        .unwrap();

        let admin = actor_for(&store, &u1.id);
        let team =
            sharing::unlink_team_documents(&store, &hub, &admin, &team.id, &[doc.id.clone()])
                .unwrap();

        assert!(team.files.is_empty());
        let doc = store.find_document_by_id(&doc.id).unwrap().unwrap();
        assert!(!doc.access.iter().any(|e| e.is_team(&team.id)));
    }

    #[test]
    fn unlinking_a_document_the_team_does_not_hold_is_denied() {
        let store = test_store();
        let hub = RoomHub::new();
        let u1 = make_user(&store, "u1");
        let team_a = make_team(&store, "A", vec![(&u1.id, TeamRole::Admin)]);
        let team_b = make_team(&store, "B", vec![(&u1.id, TeamRole::Admin)]);

        let doc = sharing::create_team_document(
            &store,
            &actor_for(&store, &u1.id),
            &CreateTeamFile {
                title: "Doc".to_string(),
                content: String::new(),
                team_id: team_a.id.clone(),
                team_role: None,
                access: None,
            },
        )
        .unwrap();

        let admin = actor_for(&store, &u1.id);
        let err =
            sharing::unlink_team_documents(&store, &hub, &admin, &team_b.id, &[doc.id.clone()])
                .unwrap_err();
        assert_eq!(err, ServiceError::Denied);

        // Nothing moved
        let team_a = store.find_team_by_id(&team_a.id).unwrap().unwrap();
        assert_eq!(team_a.files, vec![doc.id]);
    }

    #[test]
    fn revoking_the_team_entry_also_unlinks_the_document() {
        let store = test_store();
        let hub = RoomHub::new();
        let u1 = make_user(&store, "u1");
        let team = make_team(&store, "Eng", vec![(&u1.id, TeamRole::Admin)]);
        let doc = sharing::create_team_document(
            &store,
            &actor_for(&store, &u1.id),
            &CreateTeamFile {
                title: "Doc".to_string(),
                content: String::new(),
                team_id: team.id.clone(),
                team_role: None,
                access: None,
            },
        )
        .unwrap();

        let team_entry = doc
            .access
            .iter()
            .find(|e| e.is_team(&team.id))
            .unwrap()
            .id
            .clone();

        let admin = actor_for(&store, &u1.id);
        sharing::revoke_access(&store, &hub, &admin, &doc.id, &team_entry).unwrap();

        let team = store.find_team_by_id(&team.id).unwrap().unwrap();
        assert!(team.files.is_empty());
    }

    #[test]
    fn team_deletion_does_not_cascade() {
        let store = test_store();
        let u1 = make_user(&store, "u1");
        let u2 = make_user(&store, "u2");
        let team = make_team(
            &store,
            "Eng",
            vec![(&u1.id, TeamRole::Admin), (&u2.id, TeamRole::Member)],
        );
        let doc = sharing::create_team_document(
            &store,
            &actor_for(&store, &u1.id),
            &CreateTeamFile {
                title: "Doc".to_string(),
                content: String::new(),
                team_id: team.id.clone(),
                team_role: None,
                access: None,
            },
        )
        .unwrap();

        let admin = actor_for(&store, &u1.id);
        sharing::delete_team(&store, &admin, &team.id).unwrap();

        assert!(store.find_team_by_id(&team.id).unwrap().is_none());

        // The document still carries the stale team grant, and u2 still
        // carries the stale team-set entry: the acknowledged inconsistency.
        let doc = store.find_document_by_id(&doc.id).unwrap().unwrap();
        assert!(doc.access.iter().any(|e| e.is_team(&team.id)));
        let u2_record = store.find_user_by_id(&u2.id).unwrap().unwrap();
        assert!(u2_record.teams.contains(&team.id));
    }

    #[test]
    fn deleting_a_team_document_pulls_it_from_the_team_list() {
        let store = test_store();
        let u1 = make_user(&store, "u1");
        let team = make_team(&store, "Eng", vec![(&u1.id, TeamRole::Admin)]);
        let doc = sharing::create_team_document(
            &store,
            &actor_for(&store, &u1.id),
            &CreateTeamFile {
                title: "Doc".to_string(),
                content: String::new(),
                team_id: team.id.clone(),
                team_role: None,
                access: None,
            },
        )
        .unwrap();

        let admin = actor_for(&store, &u1.id);
        sharing::delete_document(&store, &admin, &doc.id).unwrap();

        assert!(store.find_document_by_id(&doc.id).unwrap().is_none());
        let team = store.find_team_by_id(&team.id).unwrap().unwrap();
        assert!(team.files.is_empty());
    }
}
