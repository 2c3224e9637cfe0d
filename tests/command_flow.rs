//! Owner command flows end to end: dispatch, awaited WHO/WHOIS replies,
//! and the exact outbound line sequences.

mod common;

use common::*;
use sentinel_proto::Event;

#[tokio::test]
async fn kick_emits_single_kick_and_no_modes() {
    let mut h = harness();
    h.feed
        .send(who_reply(HOME_CHANNEL, "ident1", "hostA", "nick1"))
        .await
        .unwrap();
    h.feed
        .send(who_reply(HOME_CHANNEL, "ident2", "hostB", "nick2"))
        .await
        .unwrap();
    h.feed.send(end_of_who(HOME_CHANNEL)).await.unwrap();

    h.session
        .handle_event(owner_says(".k nick2 flooding"))
        .await
        .unwrap();

    let sent = h.sent_lines();
    assert_eq!(sent, vec!["WHO #ops", "KICK #ops nick2 :flooding"]);
}

#[tokio::test]
async fn kick_missing_nick_is_silently_skipped() {
    let mut h = harness();
    h.feed
        .send(who_reply(HOME_CHANNEL, "ident1", "hostA", "nick1"))
        .await
        .unwrap();
    h.feed.send(end_of_who(HOME_CHANNEL)).await.unwrap();

    h.session.handle_event(owner_says(".k ghost")).await.unwrap();

    // The lookup happens, but no kick and no complaint
    assert_eq!(h.sent_lines(), vec!["WHO #ops"]);
}

#[tokio::test]
async fn kick_without_reason_uses_default() {
    let mut h = harness();
    h.feed
        .send(who_reply(HOME_CHANNEL, "ident2", "hostB", "nick2"))
        .await
        .unwrap();
    h.feed.send(end_of_who(HOME_CHANNEL)).await.unwrap();

    h.session.handle_event(owner_says(".k nick2")).await.unwrap();

    assert_eq!(
        h.sent_lines(),
        vec!["WHO #ops", "KICK #ops nick2 :no reason given"]
    );
}

#[tokio::test]
async fn kick_ban_derives_mask_from_who_record() {
    let mut h = harness();
    h.feed
        .send(who_reply(HOME_CHANNEL, "ident2", "hostB", "nick2"))
        .await
        .unwrap();
    h.feed.send(end_of_who(HOME_CHANNEL)).await.unwrap();

    h.session
        .handle_event(owner_says(".kb nick2 spamming"))
        .await
        .unwrap();

    assert_eq!(
        h.sent_lines(),
        vec![
            "WHO #ops",
            "MODE #ops +b *!*ident2@hostB",
            "KICK #ops nick2 :spamming",
        ]
    );
}

#[tokio::test]
async fn kick_ban_wildcards_tilde_ident() {
    let mut h = harness();
    h.feed
        .send(who_reply(HOME_CHANNEL, "~anon", "dial.up.net", "nick3"))
        .await
        .unwrap();
    h.feed.send(end_of_who(HOME_CHANNEL)).await.unwrap();

    h.session.handle_event(owner_says(".kb nick3")).await.unwrap();

    let sent = h.sent_lines();
    assert_eq!(sent[1], "MODE #ops +b *!*@dial.up.net");
}

#[tokio::test(start_paused = true)]
async fn mass_kick_excludes_bot_and_invoker() {
    let mut h = harness();
    // WHOIS self burst first, then the WHO burst
    h.feed.send(whois_user(BOT_NICK)).await.unwrap();
    h.feed.send(end_of_whois()).await.unwrap();
    h.feed
        .send(who_reply(HOME_CHANNEL, "ident", "bot.example.net", BOT_NICK))
        .await
        .unwrap();
    h.feed
        .send(who_reply(HOME_CHANNEL, "ident", "trusted.example.org", "boss"))
        .await
        .unwrap();
    h.feed
        .send(who_reply(HOME_CHANNEL, "a", "h1.net", "victim1"))
        .await
        .unwrap();
    h.feed
        .send(who_reply(HOME_CHANNEL, "b", "h2.net", "victim2"))
        .await
        .unwrap();
    h.feed.send(end_of_who(HOME_CHANNEL)).await.unwrap();

    h.session.handle_event(owner_says(".mk")).await.unwrap();

    let sent = h.sent_lines();
    assert_eq!(sent[0], "WHOIS sentinel sentinel");
    assert_eq!(sent[1], "WHO #ops");
    assert_eq!(
        &sent[2..],
        &[
            "KICK #ops victim1 :mass kick",
            "KICK #ops victim2 :mass kick",
        ]
    );
}

#[tokio::test]
async fn non_owner_commands_are_silently_dropped() {
    let mut h = harness();
    let stranger = Event::Privmsg {
        identity: identity("rando!x@evil.example.com"),
        target: HOME_CHANNEL.into(),
        text: ".op rando".into(),
    };

    h.session.handle_event(stranger).await.unwrap();

    assert!(h.sent_lines().is_empty());
}

#[tokio::test]
async fn missing_argument_answers_with_usage() {
    let mut h = harness();

    h.session.handle_event(owner_whispers(".op")).await.unwrap();

    assert_eq!(h.sent_lines(), vec!["PRIVMSG boss :usage: .op <nick>"]);
}

#[tokio::test]
async fn op_and_deop_act_on_configured_channel() {
    let mut h = harness();

    h.session
        .handle_event(owner_whispers(".op friend"))
        .await
        .unwrap();
    h.session
        .handle_event(owner_whispers(".deop friend"))
        .await
        .unwrap();

    assert_eq!(
        h.sent_lines(),
        vec!["MODE #ops +o friend", "MODE #ops -o friend"]
    );
}

#[tokio::test]
async fn ping_is_answered_with_pong() {
    let mut h = harness();

    h.session
        .handle_event(Event::Ping {
            token: "abc123".into(),
        })
        .await
        .unwrap();

    assert_eq!(h.sent_lines(), vec!["PONG :abc123"]);
}

#[tokio::test]
async fn add_fb_deny_sweeps_current_members() {
    let mut h = harness();
    h.feed
        .send(who_reply(HOME_CHANNEL, "x", "bad.net", "lurker"))
        .await
        .unwrap();
    h.feed
        .send(who_reply(HOME_CHANNEL, "y", "good.net", "regular"))
        .await
        .unwrap();
    h.feed.send(end_of_who(HOME_CHANNEL)).await.unwrap();

    h.session
        .handle_event(owner_whispers(".+fb #ops *!*@bad.net d"))
        .await
        .unwrap();

    assert_eq!(
        h.sent_lines(),
        vec![
            "WHO #ops",
            "MODE #ops +b *!*@bad.net",
            "KICK #ops lurker :forbidden host",
            "PRIVMSG boss :Added #ops to fb list",
        ]
    );
    assert_eq!(h.session.forbidden.len(), 1);
}

#[tokio::test]
async fn add_fb_op_rule_does_not_sweep() {
    let mut h = harness();

    h.session
        .handle_event(owner_whispers(".+fb #ops *!friend@good.net f"))
        .await
        .unwrap();

    assert_eq!(
        h.sent_lines(),
        vec!["PRIVMSG boss :Added #ops to fb list"]
    );
}

#[tokio::test]
async fn remove_fb_deny_lifts_ban() {
    let mut h = harness();
    h.session
        .forbidden
        .add("#ops", "*!*@bad.net", slirc_sentinel::store::Action::Deny)
        .unwrap();

    h.session
        .handle_event(owner_whispers(".-fb #ops *!*@bad.net d"))
        .await
        .unwrap();

    assert_eq!(
        h.sent_lines(),
        vec![
            "MODE #ops -b *!*@bad.net",
            "PRIVMSG boss :Removed #ops from fb list",
        ]
    );
    assert!(h.session.forbidden.is_empty());
}

#[tokio::test]
async fn join_enforcement_first_match_wins() {
    let mut h = harness();
    // Two rules match the same joiner; the earlier one acts
    h.session
        .forbidden
        .add("#ops", "*!*@shared.net", slirc_sentinel::store::Action::Op)
        .unwrap();
    h.session
        .forbidden
        .add("#ops", "*!evil@*", slirc_sentinel::store::Action::Deny)
        .unwrap();

    h.session
        .handle_event(joined("evil!evil@shared.net", HOME_CHANNEL))
        .await
        .unwrap();

    assert_eq!(h.sent_lines(), vec!["MODE #ops +o evil"]);
}

#[tokio::test]
async fn join_enforcement_deny_bans_and_kicks() {
    let mut h = harness();
    h.session
        .forbidden
        .add("#ops", "*!*@bad.net", slirc_sentinel::store::Action::Deny)
        .unwrap();

    h.session
        .handle_event(joined("troll!u@bad.net", HOME_CHANNEL))
        .await
        .unwrap();

    // The ban pins the joiner's own ident@host, not the stored pattern
    assert_eq!(
        h.sent_lines(),
        vec![
            "MODE #ops +b *!*u@bad.net",
            "KICK #ops troll :forbidden host",
        ]
    );
}

#[tokio::test]
async fn own_join_echo_is_not_enforced() {
    let mut h = harness();
    h.session
        .forbidden
        .add("#ops", "*!*@*", slirc_sentinel::store::Action::Deny)
        .unwrap();

    h.session
        .handle_event(joined("sentinel!ident@bot.example.net", HOME_CHANNEL))
        .await
        .unwrap();

    assert!(h.sent_lines().is_empty());
}

#[tokio::test]
async fn lc_reports_channel_list() {
    let mut h = harness();
    h.feed.send(whois_user(BOT_NICK)).await.unwrap();
    h.feed.send(whois_channels("@#ops +#lounge")).await.unwrap();
    h.feed.send(end_of_whois()).await.unwrap();

    h.session.handle_event(owner_whispers(".lc")).await.unwrap();

    assert_eq!(
        h.sent_lines(),
        vec![
            "WHOIS sentinel sentinel",
            "PRIVMSG boss :Channels: #ops #lounge",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn lc_reports_failure_when_list_absent() {
    let mut h = harness();
    // WHOIS ends without a 319 and the session has joined nothing
    h.feed.send(whois_user(BOT_NICK)).await.unwrap();
    h.feed.send(end_of_whois()).await.unwrap();

    h.session.handle_event(owner_whispers(".lc")).await.unwrap();

    assert_eq!(
        h.sent_lines(),
        vec![
            "WHOIS sentinel sentinel",
            "PRIVMSG boss :Could not determine channel list",
        ]
    );
}

#[tokio::test]
async fn jump_quits_reregisters_and_rejoins() {
    let mut h = harness();
    h.feed.send(whois_user(BOT_NICK)).await.unwrap();
    h.feed.send(whois_channels("@#a #b")).await.unwrap();
    h.feed.send(end_of_whois()).await.unwrap();
    // The reconnect hands out a fresh (empty) event stream
    let (_tx, rx) = tokio::sync::mpsc::channel(8);
    h.pending.lock().unwrap().push_back(rx);

    h.session
        .handle_event(owner_whispers(".jump new.example.net"))
        .await
        .unwrap();

    assert_eq!(
        h.sent_lines(),
        vec![
            "WHOIS sentinel sentinel",
            "QUIT :changing servers",
            "NICK sentinel",
            "USER sentinel 0 * :sentinel",
            "JOIN #a",
            "JOIN #b",
        ]
    );
    assert_eq!(h.session.config.server, "new.example.net");
}

#[tokio::test]
async fn pings_during_reply_collection_are_answered() {
    let mut h = harness();
    h.feed
        .send(who_reply(HOME_CHANNEL, "ident2", "hostB", "nick2"))
        .await
        .unwrap();
    h.feed
        .send(Event::Ping {
            token: "keepalive".into(),
        })
        .await
        .unwrap();
    h.feed.send(end_of_who(HOME_CHANNEL)).await.unwrap();

    h.session.handle_event(owner_says(".k nick2")).await.unwrap();

    let sent = h.sent_lines();
    assert!(sent.contains(&"PONG :keepalive".to_string()));
    assert!(sent.contains(&"KICK #ops nick2 :no reason given".to_string()));
}

#[tokio::test]
async fn duplicate_owner_add_is_reported() {
    let mut h = harness();

    h.session
        .handle_event(owner_whispers(&format!(".+own {OWNER_MASK}")))
        .await
        .unwrap();

    assert_eq!(
        h.sent_lines(),
        vec![format!("PRIVMSG boss :Already present: {OWNER_MASK}")]
    );
}

#[tokio::test]
async fn own_lists_masks() {
    let mut h = harness();

    h.session.handle_event(owner_whispers(".own")).await.unwrap();

    assert_eq!(
        h.sent_lines(),
        vec![format!("PRIVMSG boss :{OWNER_MASK}")]
    );
}

#[tokio::test]
async fn join_and_part_track_channels() {
    let mut h = harness();

    h.session
        .handle_event(owner_whispers(".join #lounge"))
        .await
        .unwrap();
    h.session
        .handle_event(owner_whispers(".part #lounge"))
        .await
        .unwrap();

    assert_eq!(
        h.sent_lines(),
        vec!["JOIN #lounge", "PART #lounge :leaving"]
    );
    assert!(h.session.channels().is_empty());
}

#[tokio::test]
async fn unknown_verbs_and_plain_chatter_ignored() {
    let mut h = harness();

    h.session
        .handle_event(owner_says("hello everyone"))
        .await
        .unwrap();
    h.session.handle_event(owner_says(".frobnicate")).await.unwrap();

    assert!(h.sent_lines().is_empty());
}

#[tokio::test]
async fn fb_same_mask_may_carry_both_flags() {
    let mut h = harness();
    h.feed.send(end_of_who(HOME_CHANNEL)).await.unwrap();

    h.session
        .handle_event(owner_whispers(".+fb #ops *!*@bad.net f"))
        .await
        .unwrap();
    h.session
        .handle_event(owner_whispers(".+fb #ops *!*@bad.net d"))
        .await
        .unwrap();

    assert_eq!(h.session.forbidden.len(), 2);
    let raw = std::fs::read_to_string(h.dir.path().join("fb.txt")).unwrap();
    assert_eq!(raw, "#ops *!*@bad.net f\n#ops *!*@bad.net d\n");
}

#[tokio::test]
async fn remove_fb_with_wrong_flag_is_not_found() {
    let mut h = harness();
    h.session
        .forbidden
        .add("#ops", "*!*@bad.net", slirc_sentinel::store::Action::Deny)
        .unwrap();

    h.session
        .handle_event(owner_whispers(".-fb #ops *!*@bad.net f"))
        .await
        .unwrap();

    assert_eq!(
        h.sent_lines(),
        vec!["PRIVMSG boss :No such entry: #ops *!*@bad.net f"]
    );
    assert_eq!(h.session.forbidden.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn kick_abandons_silently_when_reply_window_elapses() {
    let mut h = harness();
    // No WHO replies arrive at all; the window runs out

    h.session.handle_event(owner_says(".k ghost")).await.unwrap();

    assert_eq!(h.sent_lines(), vec!["WHO #ops"]);
}

#[tokio::test]
async fn jump_never_joins_a_channel_twice() {
    let mut h = harness();
    h.feed.send(whois_user(BOT_NICK)).await.unwrap();
    h.feed.send(whois_channels("@#a #b")).await.unwrap();
    h.feed.send(whois_channels("#B #a")).await.unwrap();
    h.feed.send(end_of_whois()).await.unwrap();
    let (_tx, rx) = tokio::sync::mpsc::channel(8);
    h.pending.lock().unwrap().push_back(rx);

    h.session
        .handle_event(owner_whispers(".jump new.example.net"))
        .await
        .unwrap();

    let sent = h.sent_lines();
    let joins: Vec<&str> = sent
        .iter()
        .filter(|l| l.starts_with("JOIN"))
        .map(String::as_str)
        .collect();
    assert_eq!(joins, vec!["JOIN #a", "JOIN #b"]);
}
