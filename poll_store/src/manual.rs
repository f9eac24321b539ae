/*!

This is the long-form manual for `poll_store` and the `feelmeter` command.

## Storage layout

The store keeps two independent collections, each a JSON document stored under its
own key of a [`KeyValueStore`](crate::KeyValueStore):

* `feelmeter_polls`: an array of polls, most recent first.

```json
[
  {
    "id": "poll_5c1f0c6e2d0a4b7e9e3a1c2b4d6f8a10",
    "title": "আপনার প্রিয় স্ট্রিট ফুড কোনটি?",
    "category": "খাদ্য",
    "options": [
      { "text": "ফুচকা", "votes": 820 },
      { "text": "চটপটি", "votes": 650 }
    ],
    "createdAt": 1760572800000,
    "duration": 5
  }
]
```

`description` is optional. `durationDays` is accepted on input as another name for `duration`.

* `feelmeter_votes`: the ballots, grouped by user and then by poll.

```json
{ "user_3f2a...": { "poll1": 0, "poll_5c1f...": 1 } }
```

A ballot is never rewritten: a second vote by the same user on the same poll is refused.

The `feelmeter` command adds a third key, `feelmeter_user`, holding the anonymous identity
generated on first use.

With the `FileStorage` backend, all the keys live in one JSON object on disk, each value
being the JSON document above encoded as a string.

## Recovery

If a collection cannot be decoded, it is dropped: the polls are replaced by the default
set and the ballots start empty. A warning is logged in both cases.

A stored poll with fewer than two or more than five options is dropped from the collection,
with a warning.

If a vote cannot be written completely, the ballot collection is restored to its previous
content and the vote is reported as failed. It can be retried.
If even that restoration fails, the error says so: the ballot stays recorded without its
vote.

## The `feelmeter` command

```text
feelmeter list                      all the polls, newest first
feelmeter show <id>                 result breakdown of one poll
feelmeter vote <id> <n>             vote for option n (starting at 1)
feelmeter create --title T --option A --option B [--category C] [--description D] [--duration N]
feelmeter update <id> [--title T] [--option A --option B ...] [--category C] [--description D] [--duration N]
feelmeter delete <id>
feelmeter categories                meter categories and suggested poll categories
feelmeter score <category> --answer 1 --answer 3 --answer 2 [--names A B]
```

`create`, `update` and `delete` need the admin password, given with `--password` or the
`FEELMETER_ADMIN_PASSWORD` environment variable.

Global options: `--config` (JSON configuration file), `--storage` (storage file),
`--user` (identity to vote as), `--verbose`.

## Configuration

```json
{
  "storagePath": "feelmeter_storage.json",
  "adminPassword": "admin",
  "userId": "optional fixed identity",
  "defaultCategory": "মজা",
  "defaultDurationDays": 7
}
```

All the fields are optional. A relative `storagePath` is resolved from the directory of the
configuration file. Command line options take precedence over the file.

*/
