use serde::Serialize;

use qwery_store::{FindOptions, IdPrefix, PaginationOptions, Repository};

use crate::app::AppContext;
use crate::cli::{ListArgs, MessagesArgs};
use crate::helpers::parse_entity;
use crate::output::{print_json, print_summaries, Summary};

fn render<T: Serialize + Summary>(items: &[T], json: bool, quiet: bool) -> anyhow::Result<()> {
    if json {
        print_json(items)
    } else {
        print_summaries(items, quiet);
        Ok(())
    }
}

fn require<'a>(value: Option<&'a str>, flag: &str, entity: IdPrefix) -> anyhow::Result<&'a str> {
    value.ok_or_else(|| anyhow::anyhow!("Listing {} requires --{}", entity.entity_name(), flag))
}

pub async fn handle_list(ctx: &AppContext<'_>, args: &ListArgs) -> anyhow::Result<()> {
    let entity = parse_entity(&args.entity)?;
    let store = ctx.open_store()?;
    let mut options = FindOptions::new().offset(args.offset);
    if let Some(limit) = args.limit {
        options = options.limit(limit);
    }
    let (json, quiet) = (args.json, ctx.quiet());

    match entity {
        IdPrefix::Organization => {
            let repository = store.organizations();
            let items = match &args.search {
                Some(query) => repository.search(query, options).await?,
                None => repository.find_all(options).await?,
            };
            render(&items, json, quiet)
        }
        IdPrefix::Project => {
            let repository = store.projects();
            let items = match (&args.search, &args.organization) {
                (Some(query), organization) => {
                    repository
                        .search(query, organization.as_deref(), options)
                        .await?
                }
                (None, Some(organization)) => options.apply(
                    repository
                        .find_all_by_organization_id(organization)
                        .await?,
                ),
                (None, None) => repository.find_all(options).await?,
            };
            render(&items, json, quiet)
        }
        IdPrefix::Datasource => {
            let repository = store.datasources();
            let items = match &args.project {
                Some(project) => options.apply(repository.find_by_project_id(project).await?),
                None => repository.find_all(options).await?,
            };
            render(&items, json, quiet)
        }
        IdPrefix::Conversation => {
            let repository = store.conversations();
            let items = match &args.project {
                Some(project) => options.apply(repository.find_by_project_id(project).await?),
                None => repository.find_all(options).await?,
            };
            render(&items, json, quiet)
        }
        IdPrefix::Message => {
            let conversation = require(args.conversation.as_deref(), "conversation", entity)?;
            let items = store
                .messages()
                .find_by_conversation_id(conversation)
                .await?;
            render(&options.apply(items), json, quiet)
        }
        IdPrefix::Notebook => {
            let repository = store.notebooks();
            let items = match &args.project {
                Some(project) => options.apply(repository.find_by_project_id(project).await?),
                None => repository.find_all(options).await?,
            };
            render(&items, json, quiet)
        }
        IdPrefix::Usage => {
            let repository = store.usage();
            let items = match &args.conversation {
                Some(conversation) => {
                    options.apply(repository.find_by_conversation_id(conversation).await?)
                }
                None => repository.find_all(options).await?,
            };
            render(&items, json, quiet)
        }
        IdPrefix::User => {
            let items = store.users().find_all(options).await?;
            render(&items, json, quiet)
        }
    }
}

pub async fn handle_messages(ctx: &AppContext<'_>, args: &MessagesArgs) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let options = match &args.cursor {
        Some(cursor) => PaginationOptions::after(cursor.clone(), args.limit),
        None => PaginationOptions::first(args.limit),
    };
    let page = store
        .messages()
        .find_by_conversation_id_paginated(&args.conversation, &options)
        .await?;

    if args.json {
        return print_json(&serde_json::json!({
            "items": page.items,
            "nextCursor": page.next_cursor,
            "hasMore": page.has_more,
        }));
    }

    print_summaries(&page.items, ctx.quiet());
    if !ctx.quiet() && page.has_more {
        if let Some(cursor) = &page.next_cursor {
            eprintln!("More messages: --cursor {}", cursor);
        }
    }
    Ok(())
}
